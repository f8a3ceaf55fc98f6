//! Maps subsample directory names onto physics sample categories.
//!
//! Rules are checked top to bottom and the first rule with a matching
//! substring wins, so a rule must sit above any rule whose patterns are
//! substrings of its own names (`MuonEG` above `Muon`, `HHto2B2Tau` above
//! `Hto2B`).

use crate::error::IndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub patterns: &'static [&'static str],
    pub category: &'static str,
}

impl Rule {
    pub fn matches(&self, subsample: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| subsample.contains(pattern))
    }
}

const fn rule(patterns: &'static [&'static str], category: &'static str) -> Rule {
    Rule { patterns, category }
}

pub const DATA_RULES: &[Rule] = &[
    rule(&["JetHT", "JetMET"], "JetMET"),
    rule(&["EGamma"], "EGamma"),
    rule(&["MuonEG"], "MuonEG"),
    rule(&["ParkingSingleMuon"], "ParkingSingleMuon"),
    rule(&["ParkingVBF"], "ParkingVBF"),
    rule(&["BTagMu"], "BTagMu"),
    rule(&["Muon"], "Muon"),
    rule(&["Tau"], "Tau"),
];

pub const MC_RULES: &[Rule] = &[
    rule(&["VBFHHto2B2Tau"], "HHbbtt"),
    rule(&["VBFHHto4B"], "HH4b"),
    rule(&["HHto2B2Tau"], "HHbbtt"),
    rule(&["HHto4B"], "HH4b"),
    rule(&["Hto2B"], "Hbb"),
    rule(&["Hto2C"], "Hcc"),
    rule(&["Hto2Tau", "HTo2Tau"], "Htautau"),
    rule(&["QCD-4Jets_HT"], "QCD"),
    rule(&["QCD_PT"], "QCD_PT"),
    rule(&["TTto"], "TT"),
    rule(&["TbarWplus", "TWminus", "TbarBQ", "TBbarQ"], "SingleTop"),
    rule(&["DYto2L-4Jets"], "DYJetsLO"),
    rule(&["DYto2L-2Jets"], "DYJetsNLO"),
    rule(
        &["VBFZto2Q", "VBFWto2Q", "VBFto2L", "VBFto2Nu", "VBFtoLNu"],
        "EWKV",
    ),
    rule(&["Wto2Q-3Jets", "WtoLNu-4Jets", "Zto2Q-4Jets"], "VJetsLO"),
    rule(&["Wto2Q-2Jets", "WtoLNu-2Jets", "Zto2Q-2Jets"], "VJetsNLO"),
    rule(
        &[
            "WW_",
            "WZ_",
            "ZZ_",
            "WWto4Q",
            "WWtoLNu2Q",
            "WZto3LNu",
            "WZto4Q",
            "ZZto2L2Q",
            "ZZto4L",
        ],
        "Diboson",
    ),
    rule(&["WGtoLNuG", "WGto2QG", "ZGto2NuG", "ZGto2QG"], "VGamma"),
];

pub fn rules(is_data: bool) -> &'static [Rule] {
    if is_data { DATA_RULES } else { MC_RULES }
}

/// Sample category for `subsample`, or [`IndexError::Classification`] when no rule matches.
pub fn classify(subsample: &str, is_data: bool) -> Result<String, IndexError> {
    rules(is_data)
        .iter()
        .find(|rule| rule.matches(subsample))
        .map(|rule| rule.category.to_string())
        .ok_or_else(|| IndexError::Classification {
            subsample: subsample.to_string(),
        })
}
