use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose};
use std::path::PathBuf;

/// An outbound message assembled from command-line flags, rendered to the
/// base64url `raw` form the API expects.
#[derive(Debug)]
pub struct OutgoingMessage {
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub body: String,
    pub html: bool,
    pub attachments: Vec<PathBuf>,
    pub in_reply_to: Option<String>,
}

impl OutgoingMessage {
    pub fn encode(&self) -> Result<String> {
        Ok(general_purpose::URL_SAFE.encode(self.render()?))
    }

    fn render(&self) -> Result<String> {
        let mut out = String::new();
        push_header(&mut out, "To", &self.to);
        if let Some(cc) = &self.cc {
            push_header(&mut out, "Cc", cc);
        }
        if let Some(bcc) = &self.bcc {
            push_header(&mut out, "Bcc", bcc);
        }
        push_header(&mut out, "Subject", &self.subject);
        if let Some(in_reply_to) = &self.in_reply_to {
            push_header(&mut out, "In-Reply-To", in_reply_to);
            push_header(&mut out, "References", in_reply_to);
        }
        push_header(&mut out, "MIME-Version", "1.0");

        if self.attachments.is_empty() && !self.html {
            push_header(&mut out, "Content-Type", "text/plain; charset=\"utf-8\"");
            out.push_str("\r\n");
            out.push_str(&self.body);
            return Ok(out);
        }

        let boundary = boundary();
        let container = if self.attachments.is_empty() {
            "multipart/alternative"
        } else {
            "multipart/mixed"
        };
        push_header(
            &mut out,
            "Content-Type",
            &format!("{container}; boundary=\"{boundary}\""),
        );
        out.push_str("\r\n");

        let text_type = if self.html { "text/html" } else { "text/plain" };
        out.push_str(&format!("--{boundary}\r\n"));
        push_header(
            &mut out,
            "Content-Type",
            &format!("{text_type}; charset=\"utf-8\""),
        );
        out.push_str("\r\n");
        out.push_str(&self.body);
        out.push_str("\r\n");

        for path in &self.attachments {
            let data = std::fs::read(path).map_err(|err| {
                Error::Io(std::io::Error::new(
                    err.kind(),
                    format!("attachment {}: {err}", path.display()),
                ))
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_owned());
            let mime_type = mime_guess::from_path(path).first_or_octet_stream();

            out.push_str(&format!("--{boundary}\r\n"));
            push_header(
                &mut out,
                "Content-Type",
                &format!("{}; name=\"{filename}\"", mime_type.essence_str()),
            );
            push_header(&mut out, "Content-Transfer-Encoding", "base64");
            push_header(
                &mut out,
                "Content-Disposition",
                &format!("attachment; filename=\"{filename}\""),
            );
            out.push_str("\r\n");

            let encoded = general_purpose::STANDARD.encode(&data);
            for chunk in encoded.as_bytes().chunks(76) {
                out.push_str(str::from_utf8(chunk).expect("base64 is ascii"));
                out.push_str("\r\n");
            }
        }
        out.push_str(&format!("--{boundary}--\r\n"));
        Ok(out)
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn boundary() -> String {
    use rand::{Rng, distr::Alphanumeric};
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}
