// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::sync::{Mutex, PoisonError};

/// `paymentData` (or `nativeRedirectData`) of the action being handled, attached to the details
/// once they are emitted.
#[derive(Debug, Default)]
pub struct PaymentDataRepository {
    payment_data: Mutex<Option<String>>,
    native_redirect_data: Mutex<Option<String>>,
}

impl PaymentDataRepository {
    pub fn payment_data(&self) -> Option<String> {
        self.payment_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_payment_data(&self, payment_data: Option<String>) {
        *self.payment_data.lock().unwrap_or_else(PoisonError::into_inner) = payment_data;
    }

    pub fn native_redirect_data(&self) -> Option<String> {
        self.native_redirect_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_native_redirect_data(&self, native_redirect_data: Option<String>) {
        *self
            .native_redirect_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = native_redirect_data;
    }
}
