//! Records stored in a collection and the bodies used to read and write them.

use serde::{Deserialize, Serialize};

use super::catalog::Metadata;

/// Fields the store may include in get/query responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Include {
    Documents,
    Metadatas,
    Embeddings,
    Distances,
    Uris,
}

/// Body for `POST .../collections/{id}/get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<serde_json::Value>,
    pub include: Vec<Include>,
    pub limit: usize,
    pub offset: usize,
}

impl GetRequest {
    /// Requests a page of records with documents, metadata and embeddings.
    pub fn page(limit: usize, offset: usize) -> Self {
        Self {
            ids: None,
            where_filter: None,
            include: vec![Include::Documents, Include::Metadatas, Include::Embeddings],
            limit,
            offset,
        }
    }

    pub fn with_include(mut self, include: Vec<Include>) -> Self {
        self.include = include;
        self
    }

    pub fn with_where(mut self, filter: serde_json::Value) -> Self {
        self.where_filter = Some(filter);
        self
    }
}

/// Response of `POST .../collections/{id}/get`; parallel arrays keyed by `ids`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<f32>>>,
}

/// One record zipped out of a [`GetResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub embedding: Option<Vec<f32>>,
}

impl GetResponse {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Zips the parallel arrays into records, in store order.
    pub fn records(&self) -> Vec<Record> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| Record {
                id: id.clone(),
                document: self
                    .documents
                    .as_ref()
                    .and_then(|d| d.get(i).cloned().flatten()),
                metadata: self
                    .metadatas
                    .as_ref()
                    .and_then(|m| m.get(i).cloned().flatten()),
                embedding: self.embeddings.as_ref().and_then(|e| e.get(i).cloned()),
            })
            .collect()
    }
}

/// Body for `POST .../collections/{id}/add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddRecords {
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Metadata>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn include_serialization() {
        let json = serde_json::to_string(&vec![Include::Documents, Include::Distances]).unwrap();
        assert_eq!(json, "[\"documents\",\"distances\"]");
    }

    #[test]
    fn get_request_body() {
        let body = serde_json::to_value(
            GetRequest::page(20, 40).with_where(json!({"schema": "public"})),
        )
        .unwrap();

        assert_eq!(
            body,
            json!({
                "where": {"schema": "public"},
                "include": ["documents", "metadatas", "embeddings"],
                "limit": 20,
                "offset": 40
            })
        );
    }

    #[test]
    fn records_zip_parallel_arrays() {
        let response: GetResponse = serde_json::from_value(json!({
            "ids": ["a", "b"],
            "documents": ["first", null],
            "metadatas": [{"page": 1}, null],
            "embeddings": [[0.1, 0.2], [0.3, 0.4]],
            "include": ["documents", "metadatas", "embeddings"]
        }))
        .unwrap();

        let records = response.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].document.as_deref(), Some("first"));
        assert_eq!(records[0].metadata.as_ref().unwrap()["page"], json!(1));
        assert!(records[1].document.is_none());
        assert_eq!(records[1].embedding, Some(vec![0.3, 0.4]));
    }

    #[test]
    fn records_tolerate_missing_arrays() {
        let response: GetResponse = serde_json::from_value(json!({
            "ids": ["a"],
            "documents": null,
            "metadatas": null,
            "embeddings": null
        }))
        .unwrap();

        let records = response.records();
        assert_eq!(records[0].id, "a");
        assert!(records[0].document.is_none());
        assert!(records[0].embedding.is_none());
    }

    #[test]
    fn add_records_skip_absent_fields() {
        let body = serde_json::to_value(AddRecords {
            ids: vec!["x".into()],
            documents: Some(vec!["hello".into()]),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(body, json!({"ids": ["x"], "documents": ["hello"]}));
    }
}
