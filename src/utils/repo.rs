use std::process::Command;

/// Parse `owner/name`, an SSH remote or an HTTPS GitHub URL into `(owner, name)`.
pub fn parse_repo_spec(spec: &str) -> Option<(String, String)> {
    let spec = spec.trim();

    // Handle SSH: git@github.com:owner/repo.git
    let path = if let Some(path) = spec.strip_prefix("git@github.com:") {
        path
    } else if spec.contains("github.com") {
        // Handle HTTPS: https://github.com/owner/repo(.git)
        spec.split("github.com").nth(1)?
    } else {
        spec
    };

    let path = path.trim_start_matches('/').trim_start_matches(':');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let name = parts.next()?;

    let valid = |s: &str| {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if !valid(owner) || !valid(name) {
        return None;
    }

    Some((owner.to_string(), name.to_string()))
}

/// New-issue page with the title field prefilled.
pub fn new_issue_url(owner: &str, repo: &str, title: &str) -> String {
    let base = format!("https://github.com/{}/{}/issues/new", owner, repo);
    let title = title.trim();
    if title.is_empty() {
        base
    } else {
        format!("{}?title={}", base, urlencoding::encode(title))
    }
}

/// Open a URL in the default browser. Returns false if no opener could be spawned.
pub fn open_url(url: &str) -> bool {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };

    Command::new(opener).arg(url).spawn().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(owner: &str, name: &str) -> Option<(String, String)> {
        Some((owner.to_string(), name.to_string()))
    }

    #[test]
    fn accepts_common_forms() {
        assert_eq!(parse_repo_spec("Cary0x/pond0x-issues"), pair("Cary0x", "pond0x-issues"));
        assert_eq!(
            parse_repo_spec("https://github.com/Cary0x/pond0x-issues"),
            pair("Cary0x", "pond0x-issues")
        );
        assert_eq!(
            parse_repo_spec("git@github.com:Cary0x/pond0x-issues.git"),
            pair("Cary0x", "pond0x-issues")
        );
        assert_eq!(
            parse_repo_spec("https://github.com/Cary0x/pond0x-issues/issues"),
            pair("Cary0x", "pond0x-issues")
        );
    }

    #[test]
    fn new_issue_title_is_encoded() {
        assert_eq!(
            new_issue_url("o", "r", "  "),
            "https://github.com/o/r/issues/new"
        );
        assert_eq!(
            new_issue_url("o", "r", "Swap fails & hangs"),
            "https://github.com/o/r/issues/new?title=Swap%20fails%20%26%20hangs"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_repo_spec("justaname"), None);
        assert_eq!(parse_repo_spec("owner/na me"), None);
        assert_eq!(parse_repo_spec(""), None);
    }
}
