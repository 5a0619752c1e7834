use serde::{Deserialize, Serialize};

/// Request payload shared by `/process_csv` and `/spreadsheets`.
/// `file_id` is a Drive file id or a spreadsheet id depending on the route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessFileRequest {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
}

/// Immediate answer to an accepted ingestion request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingResponse {
    pub status: String,
    pub texto: String,
    pub job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_fields() {
        let req: ProcessFileRequest =
            serde_json::from_str(r#"{"fileId":"abc","chatId":"user 123!"}"#).unwrap();
        assert_eq!(req.file_id, "abc");
        assert_eq!(req.chat_id, "user 123!");
    }

    #[test]
    fn request_rejects_non_string_fields() {
        let res = serde_json::from_str::<ProcessFileRequest>(r#"{"fileId":1,"chatId":"x"}"#);
        assert!(res.is_err());
        let res = serde_json::from_str::<ProcessFileRequest>(r#"{"fileId":"a"}"#);
        assert!(res.is_err());
    }
}
