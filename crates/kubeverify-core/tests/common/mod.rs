//! Stub collaborators shared by the integration tests.
//!
//! Every stub reports into one [`Calls`] so a test can assert exactly which
//! external services a verification touched.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kubeverify_core::{
    AdmissionSimulator, ApplyPatch, ExternalError, FetchRequest, FetchedManifests, ManifestSource, Provenance,
    ProvenanceRequest, ProvenanceSource, Resource, ResourceVerifier, SignatureCheck, SignatureRequest,
    SignatureVerifier,
};
use serde_json::{json, Value};

pub const SIG_REF: &str = "registry.example.com/manifests/app:v1.sig";
pub const SIGNER: &str = "release@example.com";

/// What the manifest source was asked for.
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub image_ref: Option<String>,
    pub signature_resource_ref: Option<String>,
    pub ignore_fields: Vec<String>,
    pub max_candidates: usize,
}

#[derive(Debug, Default)]
pub struct Calls {
    fetch: AtomicUsize,
    signature: AtomicUsize,
    dry_run: AtomicUsize,
    apply: AtomicUsize,
    provenance: AtomicUsize,
    fetch_requests: Mutex<Vec<FetchRecord>>,
}

impl Calls {
    pub fn fetches(&self) -> usize {
        self.fetch.load(Ordering::SeqCst)
    }

    pub fn signatures(&self) -> usize {
        self.signature.load(Ordering::SeqCst)
    }

    pub fn dry_runs(&self) -> usize {
        self.dry_run.load(Ordering::SeqCst)
    }

    pub fn applies(&self) -> usize {
        self.apply.load(Ordering::SeqCst)
    }

    pub fn provenance_lookups(&self) -> usize {
        self.provenance.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.fetches() + self.signatures() + self.dry_runs() + self.applies() + self.provenance_lookups()
    }

    pub fn last_fetch(&self) -> FetchRecord {
        self.fetch_requests.lock().unwrap().last().cloned().expect("no fetch recorded")
    }
}

struct StubManifests {
    calls: Arc<Calls>,
    candidates: Vec<Vec<u8>>,
    error: Option<String>,
}

impl ManifestSource for StubManifests {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedManifests, ExternalError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.calls.fetch_requests.lock().unwrap().push(FetchRecord {
            image_ref: request.image_ref.map(str::to_string),
            signature_resource_ref: request.signature_resource_ref.map(str::to_string),
            ignore_fields: request.ignore_fields.to_vec(),
            max_candidates: request.max_candidates,
        });
        if let Some(error) = &self.error {
            return Err(error.clone().into());
        }
        Ok(FetchedManifests {
            candidates: self.candidates.clone(),
            signature_ref: SIG_REF.to_string(),
        })
    }
}

struct StubSignatures {
    calls: Arc<Calls>,
    check: SignatureCheck,
    error: Option<String>,
}

impl SignatureVerifier for StubSignatures {
    fn verify(&self, request: &SignatureRequest<'_>) -> Result<SignatureCheck, ExternalError> {
        self.calls.signature.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.signature_ref, SIG_REF);
        if let Some(error) = &self.error {
            return Err(error.clone().into());
        }
        Ok(self.check.clone())
    }
}

/// Echoes manifests back with `webhook` merged in, stamping the dry-run
/// namespace the way the API server does.
struct StubSimulator {
    calls: Arc<Calls>,
    webhook: Value,
    error: Option<String>,
    apply_error: Option<String>,
}

fn merge(target: &mut Value, extra: &Value) {
    match (target, extra) {
        (Value::Object(target), Value::Object(extra)) => {
            for (key, value) in extra {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, extra) => *target = extra.clone(),
    }
}

impl AdmissionSimulator for StubSimulator {
    fn dry_run_create(&self, object: &[u8], namespace: Option<&str>) -> Result<Vec<u8>, ExternalError> {
        self.calls.dry_run.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.error {
            return Err(error.clone().into());
        }
        let mut value: Value = serde_yaml::from_slice(object)?;
        merge(&mut value, &self.webhook);
        if let Some(namespace) = namespace {
            value["metadata"]["namespace"] = json!(namespace);
        }
        Ok(serde_yaml::to_string(&value)?.into_bytes())
    }

    fn apply_patch(&self, manifest: &[u8], _namespace: &str) -> Result<ApplyPatch, ExternalError> {
        self.calls.apply.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.apply_error {
            return Err(error.clone().into());
        }
        Ok(ApplyPatch {
            patch: manifest.to_vec(),
            patched: manifest.to_vec(),
        })
    }
}

struct StubProvenance {
    calls: Arc<Calls>,
    result: Result<Vec<Provenance>, String>,
}

impl ProvenanceSource for StubProvenance {
    fn get(&self, request: &ProvenanceRequest<'_>) -> Result<Vec<Provenance>, ExternalError> {
        self.calls.provenance.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.signature_ref, SIG_REF);
        self.result.clone().map_err(Into::into)
    }
}

/// Builds a [`ResourceVerifier`] wired to stubs.
pub struct Harness {
    candidates: Vec<Vec<u8>>,
    fetch_error: Option<String>,
    check: SignatureCheck,
    signature_error: Option<String>,
    webhook: Value,
    simulator_error: Option<String>,
    apply_error: Option<String>,
    provenance: Result<Vec<Provenance>, String>,
}

impl Harness {
    /// Valid signature by [`SIGNER`] over the given candidates.
    pub fn new(candidates: Vec<Vec<u8>>) -> Self {
        Self {
            candidates,
            fetch_error: None,
            check: SignatureCheck {
                valid: true,
                signer: SIGNER.to_string(),
                signed_at: Some(1_714_564_800),
            },
            signature_error: None,
            webhook: json!({}),
            simulator_error: None,
            apply_error: None,
            provenance: Ok(Vec::new()),
        }
    }

    pub fn with_fetch_error(mut self, error: &str) -> Self {
        self.fetch_error = Some(error.to_string());
        self
    }

    pub fn with_check(mut self, check: SignatureCheck) -> Self {
        self.check = check;
        self
    }

    pub fn with_signature_error(mut self, error: &str) -> Self {
        self.signature_error = Some(error.to_string());
        self
    }

    /// Fields a mutating webhook adds on admission.
    pub fn with_webhook(mut self, webhook: Value) -> Self {
        self.webhook = webhook;
        self
    }

    pub fn with_simulator_error(mut self, error: &str) -> Self {
        self.simulator_error = Some(error.to_string());
        self
    }

    pub fn with_apply_error(mut self, error: &str) -> Self {
        self.apply_error = Some(error.to_string());
        self
    }

    pub fn with_provenance(mut self, result: Result<Vec<Provenance>, String>) -> Self {
        self.provenance = result;
        self
    }

    pub fn build(self) -> (ResourceVerifier, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let verifier = ResourceVerifier::new(
            Box::new(StubManifests {
                calls: Arc::clone(&calls),
                candidates: self.candidates,
                error: self.fetch_error,
            }),
            Box::new(StubSignatures {
                calls: Arc::clone(&calls),
                check: self.check,
                error: self.signature_error,
            }),
            Box::new(StubSimulator {
                calls: Arc::clone(&calls),
                webhook: self.webhook,
                error: self.simulator_error,
                apply_error: self.apply_error,
            }),
        )
        .with_provenance_source(Box::new(StubProvenance {
            calls: Arc::clone(&calls),
            result: self.provenance,
        }));
        (verifier, calls)
    }
}

pub fn configmap(namespace: &str, data: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": "app-config", "namespace": namespace},
        "data": data
    })
}

pub fn deployment(replicas: u64, image: &str) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "web", "namespace": "prod"},
        "spec": {
            "replicas": replicas,
            "selector": {"matchLabels": {"app": "web"}},
            "template": {
                "metadata": {"labels": {"app": "web"}},
                "spec": {"containers": [{"name": "web", "image": image}]}
            }
        }
    })
}

pub fn resource(value: Value) -> Resource {
    Resource::from_value(value).unwrap()
}

pub fn yaml(value: &Value) -> Vec<u8> {
    serde_yaml::to_string(value).unwrap().into_bytes()
}
