//! Text rendering of the manager's state.
//!
//! Everything here is a pure function of controller state; colour and
//! output belong to the binary.

use std::fmt::Write as _;

use passop_core::record::{Field, PasswordRecord, RecordFields};

use crate::clipboard::CopyMarker;
use crate::controller::Manager;
use crate::session::Session;

pub const MASK_CHAR: char = '•';
pub const COPY_ICON: &str = "⧉";
pub const COPIED_ICON: &str = "✓";

pub const EMPTY_TABLE: &str = "No passwords saved yet.";
pub const SIGNED_OUT: &str = "Please sign in to access your passwords.";
pub const LOADING: &str = "Loading...";
pub const DELETE_TITLE: &str = "Delete Password";
pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this password? This action cannot be undone.";

const COLUMNS: [&str; 4] = ["Website/App", "Username", "Password", "Actions"];

/// One bullet per character of `password`.
#[must_use]
pub fn mask(password: &str) -> String {
    password.chars().map(|_| MASK_CHAR).collect()
}

/// Link target for a site: used as-is when it already looks like a URL,
/// otherwise prefixed with `https://`.
#[must_use]
pub fn site_link(site: &str) -> String {
    if site.starts_with("http") {
        site.to_owned()
    } else {
        format!("https://{site}")
    }
}

#[must_use]
pub fn save_label(editing: bool) -> &'static str {
    if editing {
        "Update Password"
    } else {
        "Save Password"
    }
}

/// The entry form.
#[must_use]
pub fn render_form(form: &RecordFields, show_password: bool, editing: bool) -> String {
    let password = if show_password {
        form.password.clone()
    } else {
        mask(&form.password)
    };
    let toggle = if show_password { "hide" } else { "show" };

    let mut out = String::new();
    let _ = writeln!(out, "Website URL : {}", form.site);
    let _ = writeln!(out, "Username    : {}", form.username);
    let _ = writeln!(out, "Password    : {password}  [{toggle}]");
    let _ = write!(out, "[ {} ]", save_label(editing));
    if editing {
        out.push_str("  [ Cancel ]");
    }
    out
}

fn cell(
    record: &PasswordRecord,
    field: Field,
    copied: Option<&CopyMarker>,
    show_passwords: bool,
) -> String {
    let icon = if copied.is_some_and(|m| m.id == record.id && m.field == field) {
        COPIED_ICON
    } else {
        COPY_ICON
    };
    let value = match field {
        Field::Site => site_link(&record.site),
        Field::Username => record.username.clone(),
        Field::Password if show_passwords => record.password.clone(),
        Field::Password => mask(&record.password),
    };
    format!("{value} {icon}")
}

/// The saved-passwords table. Passwords are masked unless `show_passwords`.
#[must_use]
pub fn render_table(
    records: &[PasswordRecord],
    copied: Option<&CopyMarker>,
    show_passwords: bool,
) -> String {
    if records.is_empty() {
        return EMPTY_TABLE.to_owned();
    }

    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                cell(r, Field::Site, copied, show_passwords),
                cell(r, Field::Username, copied, show_passwords),
                cell(r, Field::Password, copied, show_passwords),
                format!("edit | delete  {}", r.id),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let line = |values: [&str; 4]| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(v, w)| format!("{v}{}", " ".repeat(w - v.chars().count())))
            .collect();
        padded.join(" │ ").trim_end().to_owned()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(COLUMNS));
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    let _ = write!(out, "{}", rule.join("─┼─"));
    for row in &rows {
        let _ = write!(
            out,
            "\n{}",
            line([
                row[0].as_str(),
                row[1].as_str(),
                row[2].as_str(),
                row[3].as_str()
            ])
        );
    }
    out
}

/// The delete confirmation dialog.
#[must_use]
pub fn render_delete_modal() -> String {
    format!("{DELETE_TITLE}\n{DELETE_PROMPT}\n[ Cancel ]  [ Delete ]")
}

/// The whole screen for the manager's current state.
#[must_use]
pub fn render(manager: &Manager) -> String {
    match manager.session() {
        Session::Loading => LOADING.to_owned(),
        Session::SignedOut => SIGNED_OUT.to_owned(),
        Session::SignedIn { .. } => {
            let copied = manager.copied();
            let mut out = render_form(
                manager.form(),
                manager.show_password(),
                manager.editing().is_some(),
            );
            out.push_str("\n\n");
            out.push_str(&render_table(
                manager.records(),
                copied.as_ref(),
                manager.show_password(),
            ));
            if manager.pending_delete().is_some() {
                out.push_str("\n\n");
                out.push_str(&render_delete_modal());
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, site: &str) -> PasswordRecord {
        PasswordRecord {
            id: id.to_owned(),
            user_id: "u1".to_owned(),
            site: site.to_owned(),
            username: "alice".to_owned(),
            password: "p1".to_owned(),
        }
    }

    #[test]
    fn password_is_masked_unless_shown() {
        let form = RecordFields::new("example.com", "alice", "secret");
        let hidden = render_form(&form, false, false);
        assert!(hidden.contains("••••••"));
        assert!(!hidden.contains("secret"));
        assert!(hidden.contains("Save Password"));

        let shown = render_form(&form, true, true);
        assert!(shown.contains("secret"));
        assert!(shown.contains("Update Password"));
    }

    #[test]
    fn site_links_keep_existing_scheme() {
        assert_eq!(site_link("example.com"), "https://example.com");
        assert_eq!(site_link("http://example.com"), "http://example.com");
        assert_eq!(site_link("https://example.com"), "https://example.com");
    }

    #[test]
    fn empty_table_message() {
        assert_eq!(render_table(&[], None, false), EMPTY_TABLE);
    }

    #[test]
    fn table_has_header_and_one_row_per_record() {
        let table = render_table(&[record("r1", "a.com"), record("r2", "b.com")], None, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        for column in COLUMNS {
            assert!(lines[0].contains(column));
        }
        assert!(lines[2].contains("https://a.com"));
        assert!(lines[3].contains("r2"));
        assert!(!table.contains("p1"));
    }

    #[test]
    fn only_the_copied_cell_shows_the_check() {
        let marker = CopyMarker {
            id: "r1".to_owned(),
            field: Field::Username,
        };
        let table = render_table(
            &[record("r1", "a.com"), record("r2", "b.com")],
            Some(&marker),
            false,
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[2].matches(COPIED_ICON).count(), 1);
        assert!(lines[2].contains(&format!("alice {COPIED_ICON}")));
        assert!(!lines[3].contains(COPIED_ICON));
    }

    #[test]
    fn table_reveals_passwords_on_request() {
        let table = render_table(&[record("r1", "a.com")], None, true);
        assert!(table.contains("p1"));
    }

    fn manager(session: Session) -> Manager {
        Manager::new(
            std::sync::Arc::new(crate::api::HttpApi::new("http://127.0.0.1:9")),
            Box::new(crate::clipboard::MemoryClipboard::new()),
            session,
        )
    }

    #[test]
    fn screen_follows_session() {
        assert_eq!(render(&manager(Session::SignedOut)), SIGNED_OUT);
        assert_eq!(render(&manager(Session::Loading)), LOADING);

        let screen = render(&manager(Session::SignedIn {
            user_id: "u1".to_owned(),
        }));
        assert!(screen.contains("Save Password"));
        assert!(screen.ends_with(EMPTY_TABLE));
    }

    #[test]
    fn pending_delete_shows_modal() {
        let mut manager = manager(Session::SignedIn {
            user_id: "u1".to_owned(),
        });
        manager.request_delete("r1");
        assert!(render(&manager).ends_with("[ Cancel ]  [ Delete ]"));
    }

    #[test]
    fn delete_modal_text() {
        let modal = render_delete_modal();
        assert!(modal.starts_with("Delete Password"));
        assert!(modal.contains("This action cannot be undone."));
        assert!(modal.contains("Cancel") && modal.contains("Delete ]"));
    }
}
