use std::sync::Arc;

use interfaces::{
    api::ApiClient, redirect::RedirectHandler, sdk::NativeSdkLauncher,
    threeds2::ThreeDs2Service,
};

/// Platform services the delegates call into.
#[derive(Clone)]
pub struct ActionHost {
    pub api_client: Arc<dyn ApiClient>,
    pub redirect_handler: Arc<dyn RedirectHandler>,
    pub threeds2_service: Arc<dyn ThreeDs2Service>,
    pub sdk_launcher: Arc<dyn NativeSdkLauncher>,
}

impl std::fmt::Debug for ActionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHost").finish_non_exhaustive()
    }
}
