//! SELECT and EXAMINE command handler.
//!
//! Both open a folder and report its size; EXAMINE opens it read-only.
//! The key pieces of the response are:
//!
//! - `* N EXISTS` -- total number of messages in the folder.
//! - `* OK [UIDVALIDITY V]` -- the folder's UID epoch.
//! - the `[READ-ONLY]` or `[READ-WRITE]` code in the tagged OK.
//!
//! Returns the selected folder name (or `None` if it cannot be opened).

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

pub async fn handle_select<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    read_only: bool,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> Option<String> {
    let verb = if read_only { "EXAMINE" } else { "SELECT" };

    let Some(folder) = mailbox.get_folder(folder_name) else {
        let resp = format!("{tag} NO [NONEXISTENT] Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return None;
    };
    if !folder.is_selectable() {
        let resp = format!("{tag} NO [CANNOT] Folder is not selectable\r\n");
        let _ = write_line(stream, &resp).await;
        return None;
    }

    let _ = write_line(
        stream,
        "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n",
    )
    .await;
    let exists = format!("* {} EXISTS\r\n", folder.messages.len());
    let _ = write_line(stream, &exists).await;
    let _ = write_line(stream, "* 0 RECENT\r\n").await;
    let _ = write_line(stream, "* OK [UIDVALIDITY 1]\r\n").await;

    let access = if read_only { "READ-ONLY" } else { "READ-WRITE" };
    let resp = format!("{tag} OK [{access}] {verb} completed\r\n");
    let _ = write_line(stream, &resp).await;
    Some(folder_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(folder_name: &str, read_only: bool, mailbox: &Mailbox) -> (String, Option<String>) {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        let selected = handle_select("A1", folder_name, read_only, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), selected)
    }

    #[tokio::test]
    async fn examine_reports_count_read_only() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .message(b"Subject: a\r\n\r\n")
            .message(b"Subject: b\r\n\r\n")
            .build();

        let (output, selected) = run("INBOX", true, &mailbox).await;

        assert_eq!(selected.as_deref(), Some("INBOX"));
        assert!(output.contains("* 2 EXISTS"));
        assert!(output.contains("A1 OK [READ-ONLY] EXAMINE completed"));
    }

    #[tokio::test]
    async fn select_is_read_write() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();
        let (output, _) = run("INBOX", false, &mailbox).await;
        assert!(output.contains("* 0 EXISTS"));
        assert!(output.contains("A1 OK [READ-WRITE] SELECT completed"));
    }

    #[tokio::test]
    async fn missing_folder_is_refused() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let (output, selected) = run("NoSuchFolder", true, &mailbox).await;

        assert!(selected.is_none());
        assert!(output.starts_with("A1 NO"));
    }

    #[tokio::test]
    async fn noselect_folder_is_refused() {
        let mailbox = MailboxBuilder::new()
            .folder("[Gmail]")
            .attribute("\\Noselect")
            .build();

        let (output, selected) = run("[Gmail]", true, &mailbox).await;

        assert!(selected.is_none());
        assert!(output.contains("not selectable"));
    }
}
