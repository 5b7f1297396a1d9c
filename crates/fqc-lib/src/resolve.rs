use crate::steps::PreprocStep;

/// Route prefix under which subject figures are served.
pub const IMAGE_ROUTE: &str = "/images";

/// Swap the default-step tag embedded in a session filename for `step`.
///
/// Session filenames always carry the default tag because the scanner only
/// lists figures for the default step.
pub fn step_filename(session_filename: &str, step: PreprocStep) -> String {
    let from = format!("-{}_", PreprocStep::DEFAULT.tag());
    let to = format!("-{}_", step.tag());
    session_filename.replace(&from, &to)
}

/// The URL the viewer fetches for one subject/session/step choice.
pub fn image_route(subject: &str, session_filename: &str, step: PreprocStep) -> String {
    format!(
        "{IMAGE_ROUTE}/{subject}/{}",
        step_filename(session_filename, step)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILENAME: &str = "sub-01_ses-A_task-rest_desc-carpetplot_bold.svg";

    #[test]
    fn substitutes_only_the_step_tag() {
        let swapped = step_filename(FILENAME, PreprocStep::Sdc);
        assert_eq!(swapped, "sub-01_ses-A_task-rest_desc-sdc_bold.svg");
        // everything else survives untouched
        assert_eq!(
            swapped.replace("-sdc_", "-carpetplot_"),
            FILENAME
        );
    }

    #[test]
    fn default_step_is_identity() {
        assert_eq!(step_filename(FILENAME, PreprocStep::DEFAULT), FILENAME);
    }

    #[test]
    fn route_prefixes_subject() {
        let route = image_route("01", FILENAME, PreprocStep::Rois);
        assert_eq!(route, "/images/01/sub-01_ses-A_task-rest_desc-rois_bold.svg");
    }
}
