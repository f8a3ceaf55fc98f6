use assert_matches::assert_matches;

use nano_index::classify::{DATA_RULES, MC_RULES, classify};
use nano_index::config::DATA_SAMPLES;
use nano_index::error::IndexError;

#[test]
fn mc_categories() {
    let cases = [
        ("GluGlutoHHto2B2Tau_kl-1p00_kt-1p00_c2-0p00_LHEweights_TuneCP5_13p6TeV", "HHbbtt"),
        ("VBFHHto4B_CV_1_C2V_1_C3_1_TuneCP5_13p6TeV_madgraph-pythia8", "HH4b"),
        ("GluGluHto2B_PT-200_M-125_TuneCP5_13p6TeV_powheg-minlo-pythia8", "Hbb"),
        ("VBFHto2Tau_M-125_TuneCP5_13p6TeV", "Htautau"),
        ("GluGluHTo2Tau_M-125_TuneCP5_13p6TeV", "Htautau"),
        ("QCD-4Jets_HT-400to600_TuneCP5_13p6TeV_madgraphMLM-pythia8", "QCD"),
        ("QCD_PT-470to600_TuneCP5_13p6TeV_pythia8", "QCD_PT"),
        ("TTto2L2Nu_TuneCP5_13p6TeV_powheg-pythia8", "TT"),
        ("TbarWplusto2L2Nu_TuneCP5_13p6TeV_powheg-pythia8", "SingleTop"),
        ("DYto2L-4Jets_MLL-50_TuneCP5_13p6TeV_madgraphMLM-pythia8", "DYJetsLO"),
        ("DYto2L-2Jets_MLL-50_TuneCP5_13p6TeV_amcatnloFXFX-pythia8", "DYJetsNLO"),
        ("VBFZto2Q_TuneCP5_13p6TeV_madgraph-pythia8", "EWKV"),
        ("WtoLNu-4Jets_TuneCP5_13p6TeV_madgraphMLM-pythia8", "VJetsLO"),
        ("WtoLNu-2Jets_TuneCP5_13p6TeV_amcatnloFXFX-pythia8", "VJetsNLO"),
        ("WW_TuneCP5_13p6TeV_pythia8", "Diboson"),
        ("ZZto2L2Q_TuneCP5_13p6TeV_powheg-pythia8", "Diboson"),
        ("WGtoLNuG-1Jets_PTG-100to200_TuneCP5_13p6TeV", "VGamma"),
    ];
    for (subsample, expected) in cases {
        assert_eq!(classify(subsample, false).unwrap(), expected, "{subsample}");
    }
}

#[test]
fn data_categories_are_known_data_samples() {
    for rule in DATA_RULES {
        assert!(DATA_SAMPLES.contains(&rule.category), "{}", rule.category);
    }
}

#[test]
fn every_rule_pattern_classifies_to_its_own_rule() {
    for (rules, is_data) in [(DATA_RULES, true), (MC_RULES, false)] {
        for rule in rules {
            for pattern in rule.patterns {
                assert_eq!(
                    classify(pattern, is_data).unwrap(),
                    rule.category,
                    "{pattern} is shadowed by an earlier rule"
                );
            }
        }
    }
}

#[test]
fn unmatched_name_is_named_in_error() {
    let err = classify("SingleNeutrino_E-10", false).unwrap_err();
    assert_matches!(&err, IndexError::Classification { subsample } if subsample == "SingleNeutrino_E-10");
    assert!(err.to_string().contains("SingleNeutrino_E-10"));
}
