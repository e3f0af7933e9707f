// =============================================================================
// GOOGLE WORKSPACE BACKEND
// =============================================================================
//
// Docs and Drive REST implementations of the document and file ports,
// authenticated as a service account.
//
// **Setup Instructions for Service Account:**
//
// 1. In Google Cloud Console, enable the Google Docs API and Google Drive API
// 2. Create a service account under "APIs & Services" > "Credentials"
// 3. On its "Keys" tab, add a JSON key and save the file
// 4. Share the templates, target documents and PDF folder with the service
//    account email (name@project.iam.gserviceaccount.com) as "Editor"
// 5. Set one of:
//    - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the JSON key file
//    - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly (for deployment)

pub mod api_client;
pub mod docs_api;
pub mod google_docs_store;
pub mod google_drive_store;
pub mod service_account;

use std::sync::Arc;

use crate::core::documents::StoreError;

pub use api_client::GoogleApiClient;
pub use google_docs_store::GoogleDocsStore;
pub use google_drive_store::GoogleDriveStore;
pub use service_account::{ServiceAccountAuth, DOCS_AND_DRIVE_SCOPES};

/// Both stores sharing one token cache.
pub async fn stores_from_env() -> Result<(Arc<GoogleDocsStore>, Arc<GoogleDriveStore>), StoreError> {
    let auth = Arc::new(ServiceAccountAuth::from_env(DOCS_AND_DRIVE_SCOPES).await?);
    tracing::info!(
        client_email = auth.client_email(),
        "Using Google service account"
    );
    let api = GoogleApiClient::new(auth);
    Ok((
        Arc::new(GoogleDocsStore::new(api.clone())),
        Arc::new(GoogleDriveStore::new(api)),
    ))
}
