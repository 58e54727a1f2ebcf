//! Method handlers
//!
//! Every handler receives an already validated [`MethodRequest`] and issues
//! one of three call shapes against PubChem:
//!
//! - single-shot passthrough of one upstream response,
//! - resolve-then-fetch (query -> CIDs -> property table for the first few),
//! - bounded fan-out over a batch of CIDs with per-element isolation.

use crate::mcp::protocol::JsonRpcError;
use crate::methods::validate::is_inchikey;
use crate::methods::{BatchOperation, MethodRequest, SearchType};
use crate::pubchem::client::{property_request, DEFAULT_PROPERTIES};
use crate::pubchem::{Payload, PubChemClient, PubChemRequest};
use crate::types::PubChemError;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

/// CIDs whose details are fetched after a resolve step
pub const RESOLVE_DETAIL_LIMIT: usize = 10;

/// Batch inputs actually sent upstream. Validation accepts up to 200 CIDs;
/// anything past this prefix is reported as truncated, not processed.
pub const BATCH_PROCESS_LIMIT: usize = 10;

/// Patents listed (with links) in a patent lookup
pub const PATENT_LIMIT: usize = 20;

pub const PATENT_URL_PREFIX: &str = "https://patents.google.com/patent/";

const BATCH_PROPERTIES: &[&str] = &[
    "MolecularFormula",
    "MolecularWeight",
    "CanonicalSMILES",
    "IUPACName",
];

pub async fn execute(
    request: &MethodRequest,
    client: &PubChemClient,
) -> Result<Payload, PubChemError> {
    debug!("Executing {}", request.name());

    match request {
        MethodRequest::SearchCompounds {
            query,
            search_type,
            max_records,
        } => search_compounds(client, query, *search_type, *max_records as usize).await,

        MethodRequest::GetCompoundInfo { cid, format } => {
            client.fetch(&compound_request(cid, format.segment())).await
        }

        MethodRequest::SearchBySmiles { smiles } => {
            let lookup = PubChemRequest::pug(["compound", "smiles", smiles.as_str(), "cids", "JSON"]);
            resolve_then_fetch(client, lookup, context([("smiles", json!(smiles))]), RESOLVE_DETAIL_LIMIT)
                .await
        }

        MethodRequest::SearchByInchi { inchi } => {
            let lookup = if is_inchikey(inchi) {
                PubChemRequest::pug(["compound", "inchikey", inchi.as_str(), "cids", "JSON"])
            } else {
                PubChemRequest::pug(["compound", "inchi", "cids", "JSON"]).with_form("inchi", inchi.as_str())
            };
            resolve_then_fetch(client, lookup, context([("inchi", json!(inchi))]), RESOLVE_DETAIL_LIMIT)
                .await
        }

        MethodRequest::SearchByCasNumber { cas_number } => {
            let lookup = PubChemRequest::pug(["compound", "name", cas_number.as_str(), "cids", "JSON"]);
            resolve_then_fetch(
                client,
                lookup,
                context([("cas_number", json!(cas_number))]),
                RESOLVE_DETAIL_LIMIT,
            )
            .await
        }

        MethodRequest::GetCompoundSynonyms { cid } => {
            client.fetch(&compound_request(cid, "synonyms/JSON")).await
        }

        MethodRequest::GetCompoundProperties { cid, properties } => {
            let names: Vec<&str> = match properties {
                Some(properties) => properties.iter().map(String::as_str).collect(),
                None => DEFAULT_PROPERTIES.to_vec(),
            };
            client.fetch(&property_request(cid, &names)).await
        }

        MethodRequest::SearchSimilarCompounds {
            smiles,
            threshold,
            max_records,
        } => client.fetch(&similarity_request(smiles, *threshold, *max_records)).await,

        MethodRequest::SubstructureSearch { smiles, max_records } => {
            let request =
                PubChemRequest::pug(["compound", "fastsubstructure", "smiles", smiles.as_str(), "cids", "JSON"])
                    .with_query("MaxRecords", max_records);
            client.fetch(&request).await
        }

        MethodRequest::Get3dConformers { cid } => {
            let request = compound_request(cid, "JSON").with_query("record_type", "3d");
            client.fetch(&request).await
        }

        MethodRequest::GetSafetyData { cid } => {
            client.fetch(&annotation_request(cid, "Safety and Hazards")).await
        }

        MethodRequest::GetToxicityInfo { cid } => {
            client.fetch(&annotation_request(cid, "Toxicity")).await
        }

        MethodRequest::SearchBioassays {
            target,
            cid,
            max_records,
        } => search_bioassays(client, target.as_deref(), cid.as_deref(), *max_records as usize).await,

        MethodRequest::GetAssayInfo { aid } => {
            let request = PubChemRequest::pug(["assay", "aid", aid.as_str(), "description", "JSON"]);
            client.fetch(&request).await
        }

        MethodRequest::BatchCompoundLookup { cids, operation } => {
            batch_compound_lookup(client, cids, *operation).await
        }

        MethodRequest::GetPatentIds { cid, smiles } => {
            get_patent_ids(client, cid.as_deref(), smiles.as_deref()).await
        }
    }
}

/// `compound/cid/<cid>/<tail...>` where `tail` is `/`-separated
pub fn compound_request(cid: &str, tail: &str) -> PubChemRequest {
    let mut segments = vec!["compound".to_string(), "cid".to_string(), cid.to_string()];
    segments.extend(tail.split('/').map(str::to_string));
    PubChemRequest::pug(segments)
}

/// PUG View annotations for one compound, restricted to a TOC heading
pub fn annotation_request(cid: &str, heading: &str) -> PubChemRequest {
    PubChemRequest::view(["data", "compound", cid, "JSON"]).with_query("heading", heading)
}

/// 2D Tanimoto similarity search; the SMILES travels in the POST body
pub fn similarity_request(smiles: &str, threshold: u8, max_records: u32) -> PubChemRequest {
    PubChemRequest::pug(["compound", "fastsimilarity_2d", "smiles", "cids", "JSON"])
        .with_form("smiles", smiles)
        .with_query("Threshold", threshold)
        .with_query("MaxRecords", max_records)
}

fn context<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn not_found(mut context: Map<String, Value>) -> Payload {
    context.insert("found".to_string(), json!(false));
    context.insert("message".to_string(), json!("No compounds found"));
    Payload::Json(Value::Object(context))
}

async fn search_compounds(
    client: &PubChemClient,
    query: &str,
    search_type: SearchType,
    max_records: usize,
) -> Result<Payload, PubChemError> {
    let lookup = match search_type {
        SearchType::Formula => PubChemRequest::pug(["compound", "fastformula", query, "cids", "JSON"]),
        SearchType::Inchi => {
            PubChemRequest::pug(["compound", "inchi", "cids", "JSON"]).with_form("inchi", query)
        }
        SearchType::Sdf => PubChemRequest::pug(["compound", "sdf", "cids", "JSON"]).with_form("sdf", query),
        SearchType::Name | SearchType::Smiles | SearchType::Cid => {
            PubChemRequest::pug(["compound", search_type.as_str(), query, "cids", "JSON"])
        }
    };

    resolve_then_fetch(
        client,
        lookup,
        context([
            ("query", json!(query)),
            ("search_type", json!(search_type.as_str())),
        ]),
        max_records,
    )
    .await
}

/// Resolves `lookup` to CIDs, then fetches the property table for the first
/// [`RESOLVE_DETAIL_LIMIT`] of them. `list_limit` bounds the CID list echoed back.
async fn resolve_then_fetch(
    client: &PubChemClient,
    lookup: PubChemRequest,
    mut result: Map<String, Value>,
    list_limit: usize,
) -> Result<Payload, PubChemError> {
    let mut cids = client.resolve_cids(&lookup).await?;
    if cids.is_empty() {
        info!("No compounds for {}", lookup.path());
        return Ok(not_found(result));
    }

    let total = cids.len();
    let detail_count = total.min(RESOLVE_DETAIL_LIMIT);
    let details = client
        .properties(&cids[..detail_count], DEFAULT_PROPERTIES)
        .await?;
    cids.truncate(list_limit);

    result.insert("found".to_string(), json!(true));
    result.insert("total_found".to_string(), json!(total));
    result.insert("cids".to_string(), json!(cids));
    result.insert("details_shown".to_string(), json!(detail_count));
    result.insert("details".to_string(), details);

    Ok(Payload::Json(Value::Object(result)))
}

async fn search_bioassays(
    client: &PubChemClient,
    target: Option<&str>,
    cid: Option<&str>,
    max_records: usize,
) -> Result<Payload, PubChemError> {
    let (mut result, request) = match (target, cid) {
        (Some(target), _) => (
            context([("target", json!(target))]),
            PubChemRequest::pug(["assay", "target", "genesymbol", target, "aids", "JSON"]),
        ),
        (None, Some(cid)) => (context([("cid", json!(cid))]), compound_request(cid, "aids/JSON")),
        (None, None) => {
            return Err(PubChemError::Protocol(JsonRpcError::invalid_params(
                "search_bioassays needs a target or a cid",
            )))
        }
    };

    let value = match client.fetch_json(&request).await {
        Ok(value) => value,
        Err(e) if e.is_not_found() => json!({}),
        Err(e) => return Err(e),
    };

    let Some(mut aids) = extract_aids(&value) else {
        if value.as_object().is_some_and(Map::is_empty) {
            result.insert("found".to_string(), json!(false));
            result.insert("message".to_string(), json!("No bioassays found"));
            return Ok(Payload::Json(Value::Object(result)));
        }
        return Ok(Payload::Json(value));
    };

    result.insert("found".to_string(), json!(!aids.is_empty()));
    result.insert("total_found".to_string(), json!(aids.len()));
    aids.truncate(max_records);
    result.insert("aids".to_string(), json!(aids));

    Ok(Payload::Json(Value::Object(result)))
}

/// AIDs from either an identifier list or a per-compound information list
fn extract_aids(value: &Value) -> Option<Vec<u64>> {
    let list = value
        .pointer("/IdentifierList/AID")
        .or_else(|| value.pointer("/InformationList/Information/0/AID"))?
        .as_array()?;

    Some(list.iter().filter_map(Value::as_u64).collect())
}

pub fn batch_request(cid: u64, operation: BatchOperation) -> PubChemRequest {
    let cid = cid.to_string();
    match operation {
        BatchOperation::Property => property_request(&cid, BATCH_PROPERTIES),
        BatchOperation::Synonyms => compound_request(&cid, "synonyms/JSON"),
        BatchOperation::Classification => compound_request(&cid, "classification/JSON"),
        BatchOperation::Description => compound_request(&cid, "description/JSON"),
    }
}

async fn batch_compound_lookup(
    client: &PubChemClient,
    cids: &[u64],
    operation: BatchOperation,
) -> Result<Payload, PubChemError> {
    let processed = &cids[..cids.len().min(BATCH_PROCESS_LIMIT)];
    if processed.len() < cids.len() {
        warn!(
            "Batch lookup truncated: processing {} of {} CIDs",
            processed.len(),
            cids.len()
        );
    }

    let lookups = processed.iter().map(|&cid| async move {
        match client.fetch_json(&batch_request(cid, operation)).await {
            Ok(data) => json!({ "cid": cid, "success": true, "data": data }),
            Err(e) => {
                warn!("Batch element {} failed: {}", cid, e);
                json!({ "cid": cid, "success": false, "error": e.to_string() })
            }
        }
    });
    let results = join_all(lookups).await;

    Ok(Payload::Json(json!({
        "operation": operation.as_str(),
        "total_requested": cids.len(),
        "processed": processed.len(),
        "truncated": processed.len() < cids.len(),
        "results": results,
    })))
}

async fn get_patent_ids(
    client: &PubChemClient,
    cid: Option<&str>,
    smiles: Option<&str>,
) -> Result<Payload, PubChemError> {
    let mut result = Map::new();

    let cid = match (cid, smiles) {
        (Some(cid), _) => cid.to_string(),
        (None, Some(smiles)) => {
            result.insert("smiles".to_string(), json!(smiles));
            let lookup = PubChemRequest::pug(["compound", "smiles", smiles, "cids", "JSON"]);
            match client.resolve_cids(&lookup).await?.first() {
                Some(cid) => cid.to_string(),
                None => return Ok(not_found(result)),
            }
        }
        (None, None) => {
            return Err(PubChemError::Protocol(JsonRpcError::invalid_params(
                "get_patent_ids needs a cid or a smiles",
            )))
        }
    };

    let value = match client.fetch_json(&compound_request(&cid, "xrefs/PatentID/JSON")).await {
        Ok(value) => value,
        Err(e) if e.is_not_found() => json!({}),
        Err(e) => return Err(e),
    };

    let patent_ids: Vec<&str> = value
        .pointer("/InformationList/Information/0/PatentID")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let patents: Vec<Value> = patent_ids
        .iter()
        .take(PATENT_LIMIT)
        .map(|id| json!({ "id": id, "url": format!("{}{}", PATENT_URL_PREFIX, id) }))
        .collect();

    result.insert("cid".to_string(), json!(cid));
    result.insert("total_patents".to_string(), json!(patent_ids.len()));
    result.insert("shown".to_string(), json!(patents.len()));
    result.insert("patents".to_string(), json!(patents));

    Ok(Payload::Json(Value::Object(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubchem::mock::{MockReply, MockTransport};
    use crate::pubchem::HttpMethod;
    use std::sync::Arc;

    fn client_with(mock: MockTransport) -> (Arc<MockTransport>, PubChemClient) {
        let mock = Arc::new(mock);
        let client = PubChemClient::new(mock.clone());
        (mock, client)
    }

    fn parse(args: Value) -> MethodRequest {
        MethodRequest::parse(&args).unwrap()
    }

    fn json_of(payload: Payload) -> Value {
        match payload {
            Payload::Json(value) => value,
            Payload::Text(text) => panic!("expected JSON payload, got text: {}", text),
        }
    }

    #[tokio::test]
    async fn test_compound_info_path_contains_cid() {
        let (mock, client) = client_with(
            MockTransport::new().on("compound/cid/2244/JSON", MockReply::Json(json!({"PC_Compounds": []}))),
        );

        let payload = execute(&parse(json!({"method": "get_compound_info", "cid": 2244})), &client)
            .await
            .unwrap();

        assert_eq!(json_of(payload), json!({"PC_Compounds": []}));
        assert_eq!(mock.paths(), vec!["pug/compound/cid/2244/JSON"]);
    }

    #[tokio::test]
    async fn test_compound_info_sdf_passes_text_through() {
        let sdf = "2244\n  -OEChem-\n\nM  END\n$$$$\n";
        let (mock, client) = client_with(MockTransport::new().on("/SDF", MockReply::Text(sdf.to_string())));

        let payload = execute(
            &parse(json!({"method": "get_compound_info", "cid": "2244", "format": "sdf"})),
            &client,
        )
        .await
        .unwrap();

        assert_eq!(payload, Payload::Text(sdf.to_string()));
        assert_eq!(mock.paths(), vec!["pug/compound/cid/2244/SDF"]);
    }

    #[tokio::test]
    async fn test_search_compounds_resolves_then_fetches_first_ten() {
        let cids: Vec<u64> = (1..=25).collect();
        let (mock, client) = client_with(
            MockTransport::new()
                .on("/cids/JSON", MockReply::Json(json!({"IdentifierList": {"CID": cids}})))
                .on("/property/", MockReply::Json(json!({"PropertyTable": {"Properties": []}}))),
        );

        let payload = execute(
            &parse(json!({"method": "search_compounds", "query": "glucose", "max_records": 15})),
            &client,
        )
        .await
        .unwrap();
        let value = json_of(payload);

        assert_eq!(value["found"], json!(true));
        assert_eq!(value["total_found"], json!(25));
        assert_eq!(value["cids"].as_array().unwrap().len(), 15);
        assert_eq!(value["details_shown"], json!(10));

        let paths = mock.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], "pug/compound/name/glucose/cids/JSON");
        assert!(paths[1].starts_with("pug/compound/cid/1,2,3,4,5,6,7,8,9,10/property/"));
    }

    #[tokio::test]
    async fn test_formula_search_uses_fastformula() {
        let (mock, client) = client_with(
            MockTransport::new().on("cids", MockReply::Json(json!({"IdentifierList": {"CID": []}}))),
        );

        execute(
            &parse(json!({"method": "search_compounds", "query": "C9H8O4", "search_type": "formula"})),
            &client,
        )
        .await
        .unwrap();

        assert_eq!(mock.paths(), vec!["pug/compound/fastformula/C9H8O4/cids/JSON"]);
    }

    #[tokio::test]
    async fn test_unmatched_smiles_is_not_found_result() {
        let (mock, client) = client_with(
            MockTransport::new().on("cids", MockReply::Json(json!({"IdentifierList": {"CID": [0]}}))),
        );

        let payload = execute(&parse(json!({"method": "search_by_smiles", "smiles": "C1CC"})), &client)
            .await
            .unwrap();
        let value = json_of(payload);

        assert_eq!(value["found"], json!(false));
        assert_eq!(value["message"], json!("No compounds found"));
        assert_eq!(value["smiles"], json!("C1CC"));
        // No detail fetch after an empty resolve
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_cas_number_404_is_not_found_result() {
        let (_, client) = client_with(MockTransport::new().on("cids", MockReply::NotFound));

        let payload = execute(
            &parse(json!({"method": "search_by_cas_number", "cas_number": "99-99-9"})),
            &client,
        )
        .await
        .unwrap();

        assert_eq!(json_of(payload)["found"], json!(false));
    }

    #[tokio::test]
    async fn test_inchi_posts_and_inchikey_gets() {
        let (mock, client) = client_with(
            MockTransport::new().on("cids", MockReply::Json(json!({"IdentifierList": {"CID": []}}))),
        );

        execute(&parse(json!({"method": "search_by_inchi", "inchi": "InChI=1S/CH4/h1H4"})), &client)
            .await
            .unwrap();
        execute(
            &parse(json!({"method": "search_by_inchi", "inchi": "VNWKTOKETHGBQD-UHFFFAOYSA-N"})),
            &client,
        )
        .await
        .unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].method, HttpMethod::Post);
        assert_eq!(calls[0].path(), "pug/compound/inchi/cids/JSON");
        assert_eq!(calls[0].form, vec![("inchi".to_string(), "InChI=1S/CH4/h1H4".to_string())]);
        assert_eq!(calls[1].method, HttpMethod::Get);
        assert_eq!(
            calls[1].path(),
            "pug/compound/inchikey/VNWKTOKETHGBQD-UHFFFAOYSA-N/cids/JSON"
        );
    }

    #[tokio::test]
    async fn test_similarity_search_is_post_with_threshold() {
        let (mock, client) = client_with(
            MockTransport::new().on("fastsimilarity_2d", MockReply::Json(json!({"IdentifierList": {"CID": [702]}}))),
        );

        execute(
            &parse(json!({"method": "search_similar_compounds", "smiles": "CCO", "threshold": 95})),
            &client,
        )
        .await
        .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Post);
        assert_eq!(calls[0].form, vec![("smiles".to_string(), "CCO".to_string())]);
        assert!(calls[0].query.contains(&("Threshold".to_string(), "95".to_string())));
        assert!(calls[0].query.contains(&("MaxRecords".to_string(), "100".to_string())));
    }

    #[tokio::test]
    async fn test_safety_data_uses_pug_view_heading() {
        let (mock, client) = client_with(MockTransport::new().on("pug_view", MockReply::Json(json!({"Record": {}}))));

        execute(&parse(json!({"method": "get_safety_data", "cid": 2244})), &client)
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].path(), "pug_view/data/compound/2244/JSON");
        assert_eq!(
            calls[0].query,
            vec![("heading".to_string(), "Safety and Hazards".to_string())]
        );
    }

    #[tokio::test]
    async fn test_batch_processes_first_ten_in_order() {
        let (mock, client) = client_with(
            MockTransport::new()
                .on("compound/cid/3/", MockReply::Fail(503))
                .on("/property/", MockReply::Json(json!({"PropertyTable": {"Properties": [{}]}}))),
        );

        let cids: Vec<u64> = (1..=15).collect();
        let payload = execute(&parse(json!({"method": "batch_compound_lookup", "cids": cids})), &client)
            .await
            .unwrap();
        let value = json_of(payload);

        assert_eq!(mock.call_count(), 10);
        assert_eq!(value["total_requested"], json!(15));
        assert_eq!(value["processed"], json!(10));
        assert_eq!(value["truncated"], json!(true));

        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 10);
        for (index, element) in results.iter().enumerate() {
            let cid = index as u64 + 1;
            assert_eq!(element["cid"], json!(cid));
            assert_eq!(element["success"], json!(cid != 3), "element {}", cid);
        }
        assert!(results[2]["error"].as_str().unwrap().contains("503"));

        let requested: Vec<String> = mock.paths();
        assert!(requested.iter().all(|p| !p.contains("compound/cid/11/")));
    }

    #[tokio::test]
    async fn test_batch_all_failures_still_succeeds() {
        let (_, client) = client_with(MockTransport::new().on("compound/cid", MockReply::Timeout));

        let payload = execute(
            &parse(json!({"method": "batch_compound_lookup", "cids": [1, 2], "operation": "synonyms"})),
            &client,
        )
        .await
        .unwrap();
        let value = json_of(payload);

        assert_eq!(value["operation"], json!("synonyms"));
        assert_eq!(value["truncated"], json!(false));
        let results = value["results"].as_array().unwrap();
        assert!(results.iter().all(|r| r["success"] == json!(false)));
    }

    #[tokio::test]
    async fn test_patent_ids_from_smiles_bounded_to_twenty() {
        let patents: Vec<String> = (0..30).map(|i| format!("US-{}-A", 1000 + i)).collect();
        let (mock, client) = client_with(
            MockTransport::new()
                .on("/smiles/", MockReply::Json(json!({"IdentifierList": {"CID": [2244, 99]}})))
                .on(
                    "xrefs/PatentID",
                    MockReply::Json(json!({"InformationList": {"Information": [{"CID": 2244, "PatentID": patents}]}})),
                ),
        );

        let payload = execute(
            &parse(json!({"method": "get_patent_ids", "smiles": "CC(=O)OC1=CC=CC=C1C(=O)O"})),
            &client,
        )
        .await
        .unwrap();
        let value = json_of(payload);

        assert_eq!(value["cid"], json!("2244"));
        assert_eq!(value["total_patents"], json!(30));
        let listed = value["patents"].as_array().unwrap();
        assert_eq!(listed.len(), 20);
        assert_eq!(listed[0]["url"], json!("https://patents.google.com/patent/US-1000-A"));
        assert_eq!(mock.paths()[1], "pug/compound/cid/2244/xrefs/PatentID/JSON");
    }

    #[tokio::test]
    async fn test_patent_ids_unresolved_smiles_is_not_found() {
        let (mock, client) = client_with(
            MockTransport::new().on("/smiles/", MockReply::Json(json!({"IdentifierList": {"CID": [0]}}))),
        );

        let payload = execute(&parse(json!({"method": "get_patent_ids", "smiles": "XYZ"})), &client)
            .await
            .unwrap();

        assert_eq!(json_of(payload)["found"], json!(false));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_bioassays_by_target_truncated() {
        let aids: Vec<u64> = (100..160).collect();
        let (mock, client) = client_with(
            MockTransport::new().on("assay/target", MockReply::Json(json!({"IdentifierList": {"AID": aids}}))),
        );

        let payload = execute(
            &parse(json!({"method": "search_bioassays", "target": "EGFR", "max_records": 5})),
            &client,
        )
        .await
        .unwrap();
        let value = json_of(payload);

        assert_eq!(value["total_found"], json!(60));
        assert_eq!(value["aids"], json!([100, 101, 102, 103, 104]));
        assert_eq!(mock.paths(), vec!["pug/assay/target/genesymbol/EGFR/aids/JSON"]);
    }

    #[tokio::test]
    async fn test_first_call_failure_is_error() {
        let (_, client) = client_with(MockTransport::new().on("assay", MockReply::Fail(500)));

        let result = execute(&parse(json!({"method": "get_assay_info", "aid": 1000})), &client).await;
        assert!(matches!(result, Err(PubChemError::Upstream { status: 500, .. })));
    }

    #[test]
    fn test_compound_request_splits_tail() {
        assert_eq!(
            compound_request("2244", "xrefs/PatentID/JSON").segments,
            vec!["compound", "cid", "2244", "xrefs", "PatentID", "JSON"]
        );
        assert_eq!(
            batch_request(7, BatchOperation::Description).path(),
            "pug/compound/cid/7/description/JSON"
        );
    }

    #[tokio::test]
    async fn test_lookup_without_any_key_is_invalid_params() {
        let (mock, client) = client_with(MockTransport::new());

        let requests = [
            MethodRequest::GetPatentIds {
                cid: None,
                smiles: None,
            },
            MethodRequest::SearchBioassays {
                target: None,
                cid: None,
                max_records: 10,
            },
        ];

        for request in requests {
            match execute(&request, &client).await {
                Err(PubChemError::Protocol(e)) => {
                    assert_eq!(e.code, crate::mcp::protocol::INVALID_PARAMS)
                }
                other => panic!("expected protocol error, got {:?}", other),
            }
        }
        assert_eq!(mock.call_count(), 0);
    }
}
