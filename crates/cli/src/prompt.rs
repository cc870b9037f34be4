//! Interactive terminal prompts.

use anyhow::{bail, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use shortsmith_core::{AuthorizationPrompt, PublishError};

/// How the run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Normal,
    Debug,
}

/// Parses the answer to the start prompt as an integer.
pub fn parse_start_choice(input: &str) -> Option<StartMode> {
    match input.trim().parse::<i64>().ok()? {
        0 => Some(StartMode::Normal),
        10 => Some(StartMode::Debug),
        _ => None,
    }
}

/// Shared so buffered input is never dropped between prompts.
static STDIN: Lazy<Mutex<Lines<BufReader<Stdin>>>> =
    Lazy::new(|| Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

async fn read_line() -> Result<Option<String>> {
    Ok(STDIN.lock().await.next_line().await?)
}

async fn print(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Asks for the start mode until a valid answer is given.
pub async fn ask_start_mode() -> Result<StartMode> {
    loop {
        print("Enter 0 to start, 10 to start in debug mode: ").await?;
        let Some(line) = read_line().await? else {
            bail!("Input closed before a start mode was chosen");
        };
        match parse_start_choice(&line) {
            Some(mode) => return Ok(mode),
            None => print("Invalid choice.\n").await?,
        }
    }
}

/// Asks the user to authorize uploads in a browser on first run.
pub struct StdinAuthorizationPrompt;

#[async_trait]
impl AuthorizationPrompt for StdinAuthorizationPrompt {
    async fn authorization_code(&self, url: &str) -> Result<String, PublishError> {
        let message = format!(
            "\nUpload access has not been granted yet. Open this page, allow access\n\
             and paste the code shown at the end:\n\n{}\n\nAuthorization code: ",
            url
        );
        print(&message)
            .await
            .map_err(|e| PublishError::Authentication(e.to_string()))?;

        read_line()
            .await
            .map_err(|e| PublishError::Authentication(e.to_string()))?
            .map(|line| line.trim().to_string())
            .ok_or_else(|| PublishError::Authentication("Input closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_choice() {
        assert_eq!(parse_start_choice("0"), Some(StartMode::Normal));
        assert_eq!(parse_start_choice("10\n"), Some(StartMode::Debug));
        assert_eq!(parse_start_choice(" 0 "), Some(StartMode::Normal));
    }

    #[test]
    fn test_parse_start_choice_accepts_integer_forms() {
        assert_eq!(parse_start_choice("00"), Some(StartMode::Normal));
        assert_eq!(parse_start_choice("-0"), Some(StartMode::Normal));
        assert_eq!(parse_start_choice("+10"), Some(StartMode::Debug));
        assert_eq!(parse_start_choice("010"), Some(StartMode::Debug));
    }

    #[test]
    fn test_parse_start_choice_rejects_others() {
        for input in ["", "1", "-10", "debug", "10a", "1 0", "10.0"] {
            assert_eq!(parse_start_choice(input), None, "input {:?}", input);
        }
    }
}
