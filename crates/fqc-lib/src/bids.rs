use anyhow::{bail, Result};

/// Entity keys that contribute to a session label.
const SESSION_ENTITY_KEYS: [&str; 3] = ["ses", "task", "session"];

/// Build the session label shown in the dropdown from a figure filename,
/// keeping only the `ses-`, `task-` and `session-` entities joined by `_`.
pub fn session_label(filename: &str) -> String {
    filename
        .split('_')
        .filter(|entity| {
            entity
                .split('-')
                .next()
                .is_some_and(|key| SESSION_ENTITY_KEYS.contains(&key))
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Extract the step tag from a figure filename, the text between the
/// first `desc-` and the following `_bold.svg`.
pub fn desc_tag(filename: &str) -> Option<&str> {
    let start = filename.find("desc-")? + "desc-".len();
    let end = filename[start..].find("_bold.svg")? + start;
    Some(&filename[start..end])
}

/// Pull `(subject, session)` out of a filename that starts with
/// `sub-<alnum>_ses-<A-Z>`. Anything else is rejected.
pub fn parse_bids_subject(filename: &str) -> Result<(String, String)> {
    let after_sub = match filename.strip_prefix("sub-") {
        Some(rest) => rest,
        None => bail!("invalid file name {filename:?}: expected a BIDS sub-*_ses-* prefix"),
    };
    let subject: String = after_sub
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    let after_ses = match after_sub[subject.len()..].strip_prefix("_ses-") {
        Some(rest) => rest,
        None => bail!("invalid file name {filename:?}: expected a BIDS sub-*_ses-* prefix"),
    };
    let session: String = after_ses
        .chars()
        .take_while(|c| c.is_ascii_uppercase())
        .collect();
    Ok((subject, session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subject_and_session() {
        let (sub, ses) = parse_bids_subject("sub-001_ses-TRT_task-rest_bold.nii.gz").unwrap();
        assert_eq!(sub, "001");
        assert_eq!(ses, "TRT");
    }

    #[test]
    fn session_run_stops_at_lowercase() {
        let (sub, ses) = parse_bids_subject("sub-ab12_ses-AB_extra").unwrap();
        assert_eq!(sub, "ab12");
        assert_eq!(ses, "AB");
    }

    #[test]
    fn rejects_non_bids_names() {
        assert!(parse_bids_subject("subject-01_ses-A").is_err());
        assert!(parse_bids_subject("sub-01-ses-A").is_err());
        assert!(parse_bids_subject("").is_err());
    }

    #[test]
    fn label_keeps_session_entities_only() {
        let label = session_label("sub-01_ses-A_task-rest_desc-carpetplot_bold.svg");
        assert_eq!(label, "ses-A_task-rest");
    }

    #[test]
    fn label_is_empty_without_session_entities() {
        assert_eq!(session_label("sub-01_desc-carpetplot_bold.svg"), "");
    }

    #[test]
    fn desc_tag_finds_step() {
        assert_eq!(
            desc_tag("sub-01_ses-A_desc-carpetplot_bold.svg"),
            Some("carpetplot")
        );
        assert_eq!(desc_tag("sub-01_ses-A_bold.svg"), None);
        assert_eq!(desc_tag("sub-01_desc-sdc_T1w.svg"), None);
    }
}
