use serde::{Deserialize, Serialize};

pub mod register_device {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub user_id: String,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        /// Push token issued to the device by the push provider
        pub token: String,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub user_id: String,
        pub token: String,
    }
}
