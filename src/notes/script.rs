//! AppleScript sources sent to the Notes application.

/// Field separator used in the flat text returned by [`notes_script`].
pub const DELIM: &str = "|||";

/// Value returned by [`note_content_script`] when no readable note matches.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Escape double quotes so a value can sit inside an AppleScript string literal.
///
/// Only `"` is escaped; backslashes and other characters pass through unchanged.
pub fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Script returning the folder names as a single `", "`-joined string.
pub fn folders_script() -> String {
    r#"tell application "Notes" to get name of every folder"#.to_string()
}

/// Script emitting one [`DELIM`]-joined line per note.
///
/// Each line is `title|||folder|||modified`, followed by `|||locked` when the
/// note is password protected. With `folder` set only that folder is visited.
pub fn notes_script(folder: Option<&str>) -> String {
    let folder_loop = match folder {
        Some(name) => format!(
            "set folderList to {{folder \"{}\"}}",
            escape_quotes(name)
        ),
        None => "set folderList to every folder".to_string(),
    };

    format!(
        r#"
tell application "Notes"
    set output to ""
    set d to "{DELIM}"
    {folder_loop}
    repeat with f in folderList
        repeat with n in every note of f
            set isLocked to password protected of n
            if isLocked then
                set lockTag to d & "locked"
            else
                set lockTag to ""
            end if
            set output to output & name of n & d & name of f & d & (modification date of n as string) & lockTag & linefeed
        end repeat
    end repeat
    return output
end tell
"#
    )
}

/// Script returning the HTML body of the first unlocked note titled `title`,
/// or [`NOT_FOUND`].
pub fn note_content_script(title: &str) -> String {
    let escaped = escape_quotes(title);
    format!(
        r#"
tell application "Notes"
    set matchedNotes to every note whose name is "{escaped}" and password protected is false
    if (count of matchedNotes) is 0 then
        return "{NOT_FOUND}"
    end if
    set n to item 1 of matchedNotes
    return body of n
end tell
"#
    )
}
