//! Emoticon review and upload.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError};
use crate::auth::{ApiRequest, MultipartForm};

/// An emoticon waiting for (or past) review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmoticonRequest {
    pub id: i64,
    pub image_url: String,
    pub status: String,
    pub created_at: String,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub file_size: u64,
}

/// A published emoticon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emoticon {
    pub id: i64,
    pub image_url: String,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub file_size: u64,
}

/// Metadata sent alongside an uploaded emoticon image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoticonUpload {
    pub name: String,
    pub price: i64,
}

impl EmoticonUpload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid_input("emoticon name is required"));
        }
        if self.price < 0 {
            return Err(ApiError::invalid_input("emoticon price must not be negative"));
        }
        Ok(())
    }
}

/// Guess an image MIME type from the file extension.
fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Image under `file`, metadata as a JSON part under `request`.
fn upload_form(file_name: &str, image: Vec<u8>, upload: &EmoticonUpload) -> Result<MultipartForm, ApiError> {
    upload.validate()?;
    if image.is_empty() {
        return Err(ApiError::invalid_input("emoticon image is empty"));
    }

    let metadata = serde_json::to_value(upload).map_err(|e| ApiError::invalid_input(e.to_string()))?;
    Ok(MultipartForm::new()
        .file("file", file_name, image, image_mime(file_name))
        .json("request", &metadata))
}

impl AdminApi {
    /// GET `/admin/emoticons/pending`
    pub async fn pending_emoticons(&self) -> Result<Vec<EmoticonRequest>, ApiError> {
        self.get_json(self.endpoint("/admin/emoticons/pending")?).await
    }

    /// GET `/emoticons/popular/viewed?limit=N`
    pub async fn popular_emoticons(&self, limit: u32) -> Result<Vec<Emoticon>, ApiError> {
        let url = self.endpoint_with_query("/emoticons/popular/viewed", &[("limit", limit.to_string())])?;
        self.get_json(url).await
    }

    /// POST `/emoticons/upload` as multipart: the image under `file` and the
    /// metadata as a JSON part under `request`.
    pub async fn upload_emoticon(
        &self,
        file_name: &str,
        image: Vec<u8>,
        upload: &EmoticonUpload,
    ) -> Result<(), ApiError> {
        let form = upload_form(file_name, image, upload)?;
        let request = ApiRequest::new(Method::POST, self.endpoint("/emoticons/upload")?).multipart(form);
        self.send(request).await?;
        Ok(())
    }

    /// POST `/admin/emoticons/{id}/accept`
    pub async fn accept_emoticon(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/emoticons/{}/accept", id))?;
        self.send_empty(Method::POST, url).await
    }

    /// POST `/admin/emoticons/{id}/reject`
    pub async fn reject_emoticon(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/emoticons/{}/reject", id))?;
        self.send_empty(Method::POST, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_validation() {
        let ok = EmoticonUpload { name: "smile".into(), price: 0 };
        assert!(ok.validate().is_ok());

        let blank = EmoticonUpload { name: "  ".into(), price: 100 };
        assert!(matches!(blank.validate(), Err(ApiError::InvalidInput(_))));

        let negative = EmoticonUpload { name: "smile".into(), price: -1 };
        assert!(matches!(negative.validate(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("smile.PNG"), Some("image/png"));
        assert_eq!(image_mime("a.b.jpeg"), Some("image/jpeg"));
        assert_eq!(image_mime("noext"), None);
        assert_eq!(image_mime("file.txt"), None);
    }

    #[test]
    fn test_upload_form_parts() {
        let upload = EmoticonUpload { name: "smile".into(), price: 100 };
        let form = upload_form("smile.gif", vec![1, 2, 3], &upload).unwrap();
        let parts = form.parts();
        assert_eq!(parts.len(), 2);

        assert_eq!(parts[0].name, "file");
        assert_eq!(parts[0].file_name.as_deref(), Some("smile.gif"));
        assert_eq!(parts[0].mime.as_deref(), Some("image/gif"));

        assert_eq!(parts[1].name, "request");
        assert_eq!(parts[1].mime.as_deref(), Some("application/json"));
        let metadata: serde_json::Value = serde_json::from_slice(&parts[1].data).unwrap();
        assert_eq!(metadata, serde_json::json!({ "name": "smile", "price": 100 }));
    }

    #[test]
    fn test_upload_form_rejects_empty_image() {
        let upload = EmoticonUpload { name: "smile".into(), price: 100 };
        assert!(upload_form("smile.gif", Vec::new(), &upload).is_err());
    }
}
