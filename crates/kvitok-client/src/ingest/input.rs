use std::fs;
use std::io::{IsTerminal, Read};

use crate::error::INGEST_HELP_COMMAND;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceKind {
    File,
    Stdin,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdin => "stdin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub source_kind: SourceKind,
    pub source_ref: Option<String>,
    pub content: Vec<u8>,
}

/// Reads the receipt payload from `path`, or from stdin when `path` is `-` or
/// absent. `stdin_override` replaces the real stdin in tests.
pub fn resolve_source(
    path: Option<&str>,
    stdin_override: Option<Vec<u8>>,
) -> ClientResult<ResolvedSource> {
    if let Some(path_value) = path
        && path_value != "-"
    {
        let content = fs::read(path_value).map_err(|error| {
            ClientError::invalid_argument_with_recovery(
                &format!("Could not read receipt file `{path_value}`: {error}"),
                vec![
                    "Verify the path exists and is readable.".to_string(),
                    "Rerun kvitok ingest <path> --user <id>.".to_string(),
                ],
            )
        })?;

        return Ok(ResolvedSource {
            source_kind: SourceKind::File,
            source_ref: Some(path_value.to_string()),
            content,
        });
    }

    match read_stdin(stdin_override)? {
        Some(content) => Ok(ResolvedSource {
            source_kind: SourceKind::Stdin,
            source_ref: None,
            content,
        }),
        None => Err(ClientError::invalid_argument_with_recovery(
            "No receipt provided. Pass a file path or pipe the JSON document via stdin.",
            vec![format!("Run `{INGEST_HELP_COMMAND}` for usage.")],
        )),
    }
}

fn read_stdin(stdin_override: Option<Vec<u8>>) -> ClientResult<Option<Vec<u8>>> {
    let buffer = match stdin_override {
        Some(value) => value,
        None => {
            if std::io::stdin().is_terminal() {
                return Ok(None);
            }
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|error| {
                    ClientError::invalid_argument_with_recovery(
                        &format!("Could not read stdin: {error}"),
                        vec!["Retry with an explicit file path argument.".to_string()],
                    )
                })?;
            buffer
        }
    };

    if buffer.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    Ok(Some(buffer))
}
