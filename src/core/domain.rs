use serde::{Deserialize, Serialize};

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
}

// Configuration abstracts config options for the catalog service
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    // fixed page size for book listings
    pub page_size: usize,
    // upper bound for uploaded cover images, in kilobytes
    pub max_image_kb: usize,
    // logical prefix for cover-image blob keys
    pub image_prefix: String,
    // filesystem root for the file-backed blob store
    pub blob_root: String,
}

impl Configuration {
    pub fn new(blob_root: &str) -> Self {
        Configuration {
            page_size: 8,
            max_image_kb: 2000,
            image_prefix: "books".to_string(),
            blob_root: blob_root.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::domain::Configuration;

    #[tokio::test]
    async fn test_should_build_config() {
        let config = Configuration::new("storage");
        assert_eq!(8, config.page_size);
        assert_eq!(2000, config.max_image_kb);
        assert_eq!("books", config.image_prefix.as_str());
        assert_eq!("storage", config.blob_root.as_str());
    }
}
