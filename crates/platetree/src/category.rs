//! Closed vocabularies for the fixed path segments of the archive.
//!
//! Each enumeration maps a path segment (or filename fragment) to a typed
//! category. Anything outside the vocabulary is an
//! [`Error::UnknownCategory`](crate::Error::UnknownCategory).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($category:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Category label used in error messages.
            pub const CATEGORY: &'static str = $category;

            /// The path segment this member is spelled as.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            fn parse_exact(s: &str) -> Option<Self> {
                match s {
                    $( $text => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

macro_rules! case_sensitive_from_str {
    ($name:ident) => {
        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_exact(s).ok_or_else(|| Error::unknown_category(Self::CATEGORY, s))
            }
        }
    };
}

vocabulary! {
    /// Top-level folder under a dataset.
    RootFolder ("root folder") {
        Images => "images",
        Workspace => "workspace",
    }
}
case_sensitive_from_str!(RootFolder);

vocabulary! {
    /// Folder directly under `images/<batch>/`.
    ImageFolder ("image folder") {
        Illum => "illum",
        Images => "images",
    }
}
case_sensitive_from_str!(ImageFolder);

vocabulary! {
    /// Folder directly under `workspace/`. Matched case-insensitively.
    WorkspaceFolder ("workspace folder") {
        Analysis => "analysis",
        Backend => "backend",
        LoadDataCsv => "load_data_csv",
        Metadata => "metadata",
        Profiles => "profiles",
        QualityControl => "quality_control",
        Qc => "qc",
        AssayDev => "assaydev",
        Pipelines => "pipelines",
    }
}

impl FromStr for WorkspaceFolder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_exact(&s.to_ascii_lowercase())
            .ok_or_else(|| Error::unknown_category(Self::CATEGORY, s))
    }
}

vocabulary! {
    /// Folder directly under `workspace/metadata/`.
    MetadataFolder ("metadata folder") {
        External => "external_metadata",
        Platemaps => "platemaps",
    }
}
case_sensitive_from_str!(MetadataFolder);

vocabulary! {
    /// Segmentation outline kinds found in `analysis/.../outlines/`.
    OutlineKind ("outline") {
        Cell => "cell_outlines",
        Nuclei => "nuclei_outlines",
        Mito => "mito_outlines",
        MitoObject => "mito_obj",
    }
}
case_sensitive_from_str!(OutlineKind);

vocabulary! {
    /// Illumination correction channels, one `.npy` file each per plate.
    Channel ("illumination channel") {
        Agp => "IllumAGP",
        Dna => "IllumDNA",
        Er => "IllumER",
        Mito => "IllumMito",
        Rna => "IllumRNA",
        Brightfield => "IllumBrightfield",
        HighZBrightfield => "IllumHighZBF",
        LowZBrightfield => "IllumLowZBF",
    }
}
case_sensitive_from_str!(Channel);

impl Channel {
    /// The channel whose name the file stem ends with, if any.
    pub fn from_stem(stem: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|channel| stem.ends_with(channel.as_str()))
            .max_by_key(|channel| channel.as_str().len())
    }
}

vocabulary! {
    /// Per-plate profile tables produced by the feature pipeline.
    ProfileKind ("profile") {
        /// `<plate>.csv[.gz]` with no kind suffix
        Default => "default",
        Augmented => "augmented",
        Normalized => "normalized",
        NormalizedNegcon => "normalized_negcon",
        FeatureSelect => "normalized_feature_select",
        FeatureSelectNegcon => "normalized_feature_select_negcon",
        FeatureSelectBatch => "normalized_feature_select_batch",
        FeatureSelectNegconBatch => "normalized_feature_select_negcon_batch",
        FeatureSelectPlate => "normalized_feature_select_plate",
        FeatureSelectNegconPlate => "normalized_feature_select_negcon_plate",
        FeatureSelectAll => "normalized_feature_select_all",
        FeatureSelectNegconAll => "normalized_feature_select_negcon_all",
    }
}
case_sensitive_from_str!(ProfileKind);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_folder_is_case_sensitive() {
        assert_eq!("images".parse::<RootFolder>().unwrap(), RootFolder::Images);
        assert_eq!(
            "workspace".parse::<RootFolder>().unwrap(),
            RootFolder::Workspace
        );
        let err = "Images".parse::<RootFolder>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown root folder: Images");
    }

    #[test]
    fn test_workspace_folder_ignores_case() {
        assert_eq!(
            "Load_Data_CSV".parse::<WorkspaceFolder>().unwrap(),
            WorkspaceFolder::LoadDataCsv
        );
        assert_eq!("QC".parse::<WorkspaceFolder>().unwrap(), WorkspaceFolder::Qc);

        let err = "Backends".parse::<WorkspaceFolder>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown workspace folder: Backends");
    }

    #[test]
    fn test_outline_kinds_stay_distinct() {
        assert_eq!(
            "mito_obj".parse::<OutlineKind>().unwrap(),
            OutlineKind::MitoObject
        );
        assert_eq!(
            "mito_outlines".parse::<OutlineKind>().unwrap(),
            OutlineKind::Mito
        );
        assert!("golgi_outlines".parse::<OutlineKind>().is_err());
    }

    #[test]
    fn test_channel_from_stem() {
        assert_eq!(Channel::from_stem("ADMJUM001_IllumAGP"), Some(Channel::Agp));
        assert_eq!(
            Channel::from_stem("BR00116991_IllumHighZBF"),
            Some(Channel::HighZBrightfield)
        );
        assert_eq!(Channel::from_stem("IllumDNA"), Some(Channel::Dna));
        assert_eq!(Channel::from_stem("BR00116991_IllumGolgi"), None);
    }

    #[test]
    fn test_vocabulary_round_trips_through_as_str() {
        for kind in ProfileKind::ALL {
            assert_eq!(kind.as_str().parse::<ProfileKind>().unwrap(), *kind);
        }
        for channel in Channel::ALL {
            assert_eq!(format!("{}", channel), channel.as_str());
        }
    }
}
