//! Argument predicates, one per method
//!
//! Each predicate looks only at the raw argument bag and answers whether
//! the method may run. They perform no I/O. A `null` field counts as absent.

use crate::methods::{BatchOperation, MethodName, OutputFormat, SearchType};
use serde_json::{Map, Value};

pub type Args = Map<String, Value>;

pub const MAX_RECORDS_LIMIT: u64 = 10_000;
pub const MAX_THRESHOLD: u64 = 100;
pub const BATCH_MAX_INPUT: usize = 200;
pub const MAX_PROPERTIES: usize = 50;

/// Property names PubChem's property table understands
pub const KNOWN_PROPERTIES: &[&str] = &[
    "MolecularFormula",
    "MolecularWeight",
    "SMILES",
    "ConnectivitySMILES",
    "CanonicalSMILES",
    "IsomericSMILES",
    "InChI",
    "InChIKey",
    "IUPACName",
    "Title",
    "XLogP",
    "ExactMass",
    "MonoisotopicMass",
    "TPSA",
    "Complexity",
    "Charge",
    "HBondDonorCount",
    "HBondAcceptorCount",
    "RotatableBondCount",
    "HeavyAtomCount",
    "IsotopeAtomCount",
    "AtomStereoCount",
    "DefinedAtomStereoCount",
    "UndefinedAtomStereoCount",
    "BondStereoCount",
    "DefinedBondStereoCount",
    "UndefinedBondStereoCount",
    "CovalentUnitCount",
    "PatentCount",
    "PatentFamilyCount",
    "LiteratureCount",
    "Volume3D",
    "XStericQuadrupole3D",
    "YStericQuadrupole3D",
    "ZStericQuadrupole3D",
    "FeatureCount3D",
    "FeatureAcceptorCount3D",
    "FeatureDonorCount3D",
    "FeatureAnionCount3D",
    "FeatureCationCount3D",
    "FeatureRingCount3D",
    "FeatureHydrophobeCount3D",
    "ConformerModelRMSD3D",
    "EffectiveRotorCount3D",
    "ConformerCount3D",
    "Fingerprint2D",
];

pub fn is_valid(method: MethodName, args: &Args) -> bool {
    match method {
        MethodName::SearchCompounds => search_compounds(args),
        MethodName::GetCompoundInfo => get_compound_info(args),
        MethodName::SearchBySmiles => smiles_only(args),
        MethodName::SearchByInchi => search_by_inchi(args),
        MethodName::SearchByCasNumber => search_by_cas_number(args),
        MethodName::GetCompoundSynonyms
        | MethodName::Get3dConformers
        | MethodName::GetSafetyData
        | MethodName::GetToxicityInfo => cid_only(args),
        MethodName::GetCompoundProperties => get_compound_properties(args),
        MethodName::SearchSimilarCompounds => search_similar_compounds(args),
        MethodName::SubstructureSearch => substructure_search(args),
        MethodName::SearchBioassays => search_bioassays(args),
        MethodName::GetAssayInfo => get_assay_info(args),
        MethodName::BatchCompoundLookup => batch_compound_lookup(args),
        MethodName::GetPatentIds => get_patent_ids(args),
    }
}

pub fn search_compounds(args: &Args) -> bool {
    required(args, "query", is_non_empty_str)
        && optional(args, "search_type", |v| {
            v.as_str().and_then(SearchType::parse).is_some()
        })
        && optional(args, "max_records", is_record_count)
}

pub fn get_compound_info(args: &Args) -> bool {
    required(args, "cid", is_identifier)
        && optional(args, "format", |v| {
            v.as_str().and_then(OutputFormat::parse).is_some()
        })
}

pub fn smiles_only(args: &Args) -> bool {
    required(args, "smiles", is_non_empty_str)
}

pub fn cid_only(args: &Args) -> bool {
    required(args, "cid", is_identifier)
}

pub fn search_by_inchi(args: &Args) -> bool {
    required(args, "inchi", |v| {
        v.as_str()
            .is_some_and(|s| s.starts_with("InChI=") || is_inchikey(s))
    })
}

pub fn search_by_cas_number(args: &Args) -> bool {
    required(args, "cas_number", |v| v.as_str().is_some_and(is_cas_number))
}

pub fn get_compound_properties(args: &Args) -> bool {
    required(args, "cid", is_identifier) && optional(args, "properties", is_property_list)
}

pub fn search_similar_compounds(args: &Args) -> bool {
    required(args, "smiles", is_non_empty_str)
        && optional(args, "threshold", |v| {
            v.as_u64().is_some_and(|n| n <= MAX_THRESHOLD)
        })
        && optional(args, "max_records", is_record_count)
}

pub fn substructure_search(args: &Args) -> bool {
    required(args, "smiles", is_non_empty_str) && optional(args, "max_records", is_record_count)
}

pub fn search_bioassays(args: &Args) -> bool {
    let has_target = field(args, "target").is_some();
    let has_cid = field(args, "cid").is_some();

    (has_target || has_cid)
        && optional(args, "target", is_non_empty_str)
        && optional(args, "cid", is_identifier)
        && optional(args, "max_records", is_record_count)
}

pub fn get_assay_info(args: &Args) -> bool {
    required(args, "aid", is_identifier)
}

pub fn batch_compound_lookup(args: &Args) -> bool {
    required(args, "cids", |v| {
        v.as_array().is_some_and(|cids| {
            !cids.is_empty()
                && cids.len() <= BATCH_MAX_INPUT
                && cids.iter().all(|cid| cid.as_u64().is_some_and(|n| n > 0))
        })
    }) && optional(args, "operation", |v| {
        v.as_str().and_then(BatchOperation::parse).is_some()
    })
}

pub fn get_patent_ids(args: &Args) -> bool {
    let has_cid = field(args, "cid").is_some();
    let has_smiles = field(args, "smiles").is_some();

    (has_cid || has_smiles)
        && optional(args, "cid", is_identifier)
        && optional(args, "smiles", is_non_empty_str)
}

fn field<'a>(args: &'a Args, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|value| !value.is_null())
}

fn required(args: &Args, key: &str, check: impl Fn(&Value) -> bool) -> bool {
    field(args, key).is_some_and(check)
}

fn optional(args: &Args, key: &str, check: impl Fn(&Value) -> bool) -> bool {
    field(args, key).map_or(true, check)
}

fn is_non_empty_str(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn is_record_count(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|n| (1..=MAX_RECORDS_LIMIT).contains(&n))
}

/// Positive integer, or a string of ASCII digits naming one
pub fn is_identifier(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_u64().is_some_and(|n| n > 0),
        Value::String(s) => {
            !s.is_empty()
                && s.bytes().all(|b| b.is_ascii_digit())
                && s.parse::<u64>().is_ok_and(|n| n > 0)
        }
        _ => false,
    }
}

fn is_property_list(value: &Value) -> bool {
    value.as_array().is_some_and(|properties| {
        !properties.is_empty()
            && properties.len() <= MAX_PROPERTIES
            && properties
                .iter()
                .all(|p| p.as_str().is_some_and(|p| KNOWN_PROPERTIES.contains(&p)))
    })
}

/// `NNNNNNN-NN-N` with 2 to 7 leading digits
pub fn is_cas_number(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    let &[head, middle, check] = parts.as_slice() else {
        return false;
    };

    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    (2..=7).contains(&head.len())
        && middle.len() == 2
        && check.len() == 1
        && digits(head)
        && digits(middle)
        && digits(check)
}

/// 27-character InChIKey: 14 and 10 uppercase letters plus a protonation flag
pub fn is_inchikey(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    let &[skeleton, stereo, protonation] = parts.as_slice() else {
        return false;
    };

    let upper = |part: &str| part.bytes().all(|b| b.is_ascii_uppercase());

    skeleton.len() == 14
        && stereo.len() == 10
        && protonation.len() == 1
        && upper(skeleton)
        && upper(stereo)
        && upper(protonation)
}
