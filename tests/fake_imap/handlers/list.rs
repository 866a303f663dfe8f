//! LIST command handler.
//!
//! One `* LIST` line per folder, carrying its name attributes and the
//! mailbox-wide hierarchy separator:
//!
//! ```text
//! * LIST (\HasNoChildren) "." "INBOX"
//! * LIST (\All \HasNoChildren) "/" "[Gmail]/All Mail"
//! A0002 OK LIST completed
//! ```

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    for folder in &mailbox.folders {
        let mut attributes = folder.attributes.clone();
        attributes.push("\\HasNoChildren".to_string());
        let line = format!(
            "* LIST ({}) \"{}\" \"{}\"\r\n",
            attributes.join(" "),
            mailbox.separator,
            folder.name
        );
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }
    let resp = format!("{tag} OK LIST completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_list(tag, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn reports_separator_and_attributes() {
        let mailbox = MailboxBuilder::new()
            .separator('.')
            .folder("INBOX")
            .folder("Lists.rust")
            .attribute("\\Marked")
            .build();

        let output = run("A1", &mailbox).await;

        assert!(output.contains("* LIST (\\HasNoChildren) \".\" \"INBOX\"\r\n"));
        assert!(output.contains("* LIST (\\Marked \\HasNoChildren) \".\" \"Lists.rust\"\r\n"));
        assert!(output.ends_with("A1 OK LIST completed\r\n"));
    }

    #[tokio::test]
    async fn empty_mailbox_returns_only_ok() {
        let mailbox = MailboxBuilder::new().build();
        let output = run("T2", &mailbox).await;

        assert_eq!(output, "T2 OK LIST completed\r\n");
    }
}
