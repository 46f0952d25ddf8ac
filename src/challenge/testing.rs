//! In-memory collaborator substitutes shared by the subsystem's tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::challenge::error::{DeliveryError, DirectoryError};
use crate::challenge::purpose::Purpose;
use crate::directory::{AccountRecord, UserDirectory};
use crate::notify::{Notice, Notifier};

/// Notifier that records every message instead of delivering it.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notice)>>,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sent(&self) -> Vec<(String, Notice)> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, destination: &str, notice: &Notice) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((destination.to_string(), notice.clone()));
        Ok(())
    }
}

/// Notifier whose transport is permanently down.
pub(crate) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _destination: &str, _notice: &Notice) -> Result<(), DeliveryError> {
        Err(DeliveryError::new("transport down"))
    }
}

/// One applied purpose effect, as the fake directory records it.
#[derive(Clone, Debug)]
pub(crate) struct AppliedEffect {
    pub(crate) subject_id: Uuid,
    pub(crate) purpose: Purpose,
    pub(crate) payload: Option<String>,
}

/// User directory backed by a map, with a record of applied effects.
#[derive(Default)]
pub(crate) struct MemoryDirectory {
    accounts: Mutex<HashMap<String, AccountRecord>>,
    effects: Mutex<Vec<AppliedEffect>>,
}

impl MemoryDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, email: &str) -> Uuid {
        let subject_id = Uuid::new_v4();
        self.accounts.lock().expect("directory lock").insert(
            email.to_string(),
            AccountRecord {
                subject_id,
                destination: email.to_string(),
            },
        );
        subject_id
    }

    pub(crate) fn effects(&self) -> Vec<AppliedEffect> {
        self.effects.lock().expect("directory lock").clone()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError> {
        Ok(self
            .accounts
            .lock()
            .expect("directory lock")
            .get(identifier)
            .cloned())
    }

    async fn apply_effect(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        payload: Option<&str>,
    ) -> Result<(), DirectoryError> {
        self.effects.lock().expect("directory lock").push(AppliedEffect {
            subject_id,
            purpose,
            payload: payload.map(str::to_string),
        });
        Ok(())
    }
}
