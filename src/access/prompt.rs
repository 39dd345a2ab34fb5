use async_trait::async_trait;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// The user's answer to an access prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Allow,
    Deny,
    Cancel,
}

/// Asks the user, out of band, whether a root may be read.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn request_access(&self, path: &Path) -> PromptResponse;
}

/// Prompts on the controlling terminal.
///
/// Cancels when stdin is not a terminal so unattended runs never hang.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn request_access(&self, path: &Path) -> PromptResponse {
        if !io::stdin().is_terminal() {
            return PromptResponse::Cancel;
        }

        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || ask(&path))
            .await
            .unwrap_or(PromptResponse::Cancel)
    }
}

fn ask(path: &Path) -> PromptResponse {
    eprint!("Allow plugscan to read {}? [y/n] ", path.display());
    let _ = io::stderr().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => PromptResponse::Cancel,
        Ok(_) => parse_answer(&line),
    }
}

fn parse_answer(line: &str) -> PromptResponse {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => PromptResponse::Allow,
        "n" | "no" => PromptResponse::Deny,
        _ => PromptResponse::Cancel,
    }
}

/// Denies every request without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyPrompter;

#[async_trait]
impl Prompter for DenyPrompter {
    async fn request_access(&self, _path: &Path) -> PromptResponse {
        PromptResponse::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), PromptResponse::Allow);
        assert_eq!(parse_answer(" YES "), PromptResponse::Allow);
        assert_eq!(parse_answer("n"), PromptResponse::Deny);
        assert_eq!(parse_answer(""), PromptResponse::Cancel);
        assert_eq!(parse_answer("maybe"), PromptResponse::Cancel);
    }

    #[tokio::test]
    async fn test_deny_prompter() {
        assert_eq!(
            DenyPrompter.request_access(Path::new("/Library")).await,
            PromptResponse::Deny
        );
    }
}
