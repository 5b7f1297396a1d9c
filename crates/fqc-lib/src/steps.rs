use serde::{Deserialize, Serialize};

/// Preprocessing-step diagnostics emitted by the pipeline, keyed by the
/// `desc-` entity embedded in each figure filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocStep {
    Sdc,
    Bbregister,
    Carpetplot,
    Confoundcorr,
    Rois,
}

impl PreprocStep {
    /// Step whose figures anchor session discovery and the initial view.
    pub const DEFAULT: PreprocStep = PreprocStep::Carpetplot;

    pub fn all() -> [PreprocStep; 5] {
        [
            PreprocStep::Sdc,
            PreprocStep::Bbregister,
            PreprocStep::Carpetplot,
            PreprocStep::Confoundcorr,
            PreprocStep::Rois,
        ]
    }

    /// The `desc-` tag as written in figure filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            PreprocStep::Sdc => "sdc",
            PreprocStep::Bbregister => "bbregister",
            PreprocStep::Carpetplot => "carpetplot",
            PreprocStep::Confoundcorr => "confoundcorr",
            PreprocStep::Rois => "rois",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PreprocStep::Sdc => "Susceptibility distortion correction",
            PreprocStep::Bbregister => "Alignment of functional and anatomical MRI data",
            PreprocStep::Carpetplot => "BOLD Summary",
            PreprocStep::Confoundcorr => "Correlations among nuisance regressors",
            PreprocStep::Rois => "Brain mask and (temporal/anatomical) CompCor ROIs",
        }
    }

    /// Reverse lookup from a filename tag. Tags outside the table are not
    /// offered in the viewer.
    pub fn from_tag(tag: &str) -> Option<PreprocStep> {
        PreprocStep::all().into_iter().find(|step| step.tag() == tag)
    }
}
