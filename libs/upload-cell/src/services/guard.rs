// =====================================================================================
// UPLOAD GUARD - BATCH AND PER-FILE CONTENT VALIDATION
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{instrument, warn};

use crate::models::{
    ScreenedFile, UploadBatchResult, UploadPolicy, UploadRateRecord, UploadedFile,
};
use crate::services::sanitize::ImageSanitizer;
use audit_cell::{AuditService, SecurityEvent, SecurityEventKind, Severity};
use shared_crypto::CryptoService;
use shared_store::{BlockList, Store};

/// Leading bytes inspected for signature verification and polyglot scanning.
const INSPECTION_WINDOW: usize = 1024;

/// Patterns that are suspicious both in filenames and embedded in image
/// bytes: script tags, script-scheme URIs, event-handler attributes, eval
/// calls, and directory traversal including URL-encoded variants.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    r"(?i)<script",
    r"(?i)javascript:",
    r"(?i)vbscript:",
    r"(?i)on\w+\s*=",
    r"(?i)eval\s*\(",
    r"\.\./",
    r"(?i)%2e%2e%2f",
    r"(?i)\.\.%2f",
    r"(?i)%2e%2e/",
];

pub struct UploadGuardService {
    store: Store,
    blocked_hashes: BlockList,
    crypto: Arc<CryptoService>,
    audit: Arc<AuditService>,
    policy: UploadPolicy,
    suspicious_patterns: Vec<Regex>,
}

impl UploadGuardService {
    pub fn new(
        store: Store,
        crypto: Arc<CryptoService>,
        audit: Arc<AuditService>,
        policy: UploadPolicy,
    ) -> Self {
        let blocked_hashes = BlockList::new(store.clone(), "filehash");
        let suspicious_patterns = SUSPICIOUS_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            store,
            blocked_hashes,
            crypto,
            audit,
            policy,
            suspicious_patterns,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    // ---------------------------------------------------------------------------------
    // Content-hash denylist
    // ---------------------------------------------------------------------------------

    pub fn calculate_file_hash(&self, data: &[u8]) -> String {
        self.crypto.sha256_hex(data)
    }

    pub async fn is_file_hash_blocked(&self, hash: &str) -> bool {
        self.blocked_hashes.contains(hash).await
    }

    pub async fn block_file_hash(&self, hash: &str, reason: &str) {
        if let Err(e) = self.blocked_hashes.block(hash).await {
            warn!(hash, error = %e, "file hash block failed");
            return;
        }
        self.audit
            .log_security_event(
                SecurityEvent::new(SecurityEventKind::FileHashBlocked, Severity::High)
                    .detail("hash", hash)
                    .detail("reason", reason),
            )
            .await;
    }

    pub fn blocked_hashes(&self) -> &BlockList {
        &self.blocked_hashes
    }

    // ---------------------------------------------------------------------------------
    // Batch validation
    // ---------------------------------------------------------------------------------

    pub async fn validate_upload(
        &self,
        files: Vec<UploadedFile>,
        ip: &str,
        user_agent: Option<&str>,
    ) -> UploadBatchResult {
        self.validate_upload_at(files, ip, user_agent, Utc::now())
            .await
    }

    #[instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn validate_upload_at(
        &self,
        files: Vec<UploadedFile>,
        ip: &str,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> UploadBatchResult {
        // 1. Per-IP rolling-hour rate limit rejects the whole batch.
        if self.record_upload_attempt(ip, now).await {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::UploadRateLimited, Severity::Medium)
                        .with_ip(ip)
                        .detail("user_agent", user_agent.unwrap_or("")),
                )
                .await;
            return UploadBatchResult {
                valid: false,
                errors: vec!["upload limit reached, try again later".to_string()],
                files: Vec::new(),
            };
        }

        // 2. Batch size cap.
        if files.len() > self.policy.max_files_per_upload {
            return UploadBatchResult {
                valid: false,
                errors: vec![format!(
                    "at most {} files may be uploaded at once",
                    self.policy.max_files_per_upload
                )],
                files: Vec::new(),
            };
        }

        let mut screened = Vec::with_capacity(files.len());
        for file in files {
            screened.push(self.screen_file(file, ip).await);
        }

        let valid = screened.iter().all(|f| f.valid);
        UploadBatchResult {
            valid,
            errors: Vec::new(),
            files: screened,
        }
    }

    /// Returns true when this attempt exceeds the hourly allowance.
    async fn record_upload_attempt(&self, ip: &str, now: DateTime<Utc>) -> bool {
        let key = format!("uploadrate:{}", ip);

        let mut record = match self.store.get_json::<UploadRateRecord>(&key).await {
            Ok(Some(record)) => record,
            Ok(None) => UploadRateRecord {
                count: 0,
                last_attempt: now,
            },
            Err(e) => {
                warn!(ip, error = %e, "upload rate read failed, allowing upload");
                return false;
            }
        };

        // Rolling reset: an hour of silence clears the counter.
        if now - record.last_attempt > chrono::Duration::hours(1) {
            record.count = 0;
        }
        record.count += 1;
        record.last_attempt = now;

        let limited = record.count > self.policy.max_uploads_per_hour;

        if let Err(e) = self
            .store
            .set_json(&key, &record, Some(Duration::from_secs(2 * 3600)))
            .await
        {
            warn!(ip, error = %e, "upload rate write failed");
        }

        limited
    }

    // ---------------------------------------------------------------------------------
    // Per-file checks
    // ---------------------------------------------------------------------------------

    async fn screen_file(&self, file: UploadedFile, ip: &str) -> ScreenedFile {
        let mut errors = Vec::new();

        if file.data.len() > self.policy.max_file_size {
            errors.push(format!(
                "file exceeds the {} byte size limit",
                self.policy.max_file_size
            ));
        }

        if !self
            .policy
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&file.content_type))
        {
            errors.push(format!("file type {} is not allowed", file.content_type));
        }

        let extension = file
            .filename
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if !self.policy.allowed_extensions.contains(&extension) {
            errors.push(format!("file extension .{} is not allowed", extension));
        }
        // Independent of the allow-list: executables are refused even if a
        // misconfigured allow-list were to admit them.
        if self.policy.blocked_extensions.contains(&extension) {
            errors.push(format!("file extension .{} is blocked", extension));
        }

        if self
            .suspicious_patterns
            .iter()
            .any(|p| p.is_match(&file.filename))
        {
            errors.push("filename contains a suspicious pattern".to_string());
        }

        let hash = self.calculate_file_hash(&file.data);
        if self.is_file_hash_blocked(&hash).await {
            errors.push("file content is on the denylist".to_string());
        }

        let mut needs_sanitization = false;
        if file.content_type.starts_with("image/") && errors.is_empty() {
            let window = &file.data[..file.data.len().min(INSPECTION_WINDOW)];

            if !Self::signature_matches(&file.content_type, window) {
                errors.push("file content does not match its declared type".to_string());
            } else {
                // Polyglot detection: image bytes that also contain script
                // fragments are re-encoded rather than rejected.
                let text = String::from_utf8_lossy(window);
                if self.suspicious_patterns.iter().any(|p| p.is_match(&text)) {
                    needs_sanitization = true;
                }
            }
        }

        if !errors.is_empty() {
            self.audit
                .log_security_event(
                    SecurityEvent::new(SecurityEventKind::UploadRejected, Severity::Medium)
                        .with_ip(ip)
                        .detail("filename", &file.filename)
                        .detail("content_type", &file.content_type)
                        .detail("errors", &errors),
                )
                .await;
            return ScreenedFile {
                filename: file.filename,
                content_type: file.content_type,
                data: Vec::new(),
                valid: false,
                sanitized: false,
                errors,
            };
        }

        if needs_sanitization {
            match ImageSanitizer::re_encode(&file) {
                Ok((clean, content_type)) => {
                    self.audit
                        .log_security_event(
                            SecurityEvent::new(SecurityEventKind::FileSanitized, Severity::Medium)
                                .with_ip(ip)
                                .detail("filename", &file.filename)
                                .detail("original_type", &file.content_type)
                                .detail("clean_type", &content_type),
                        )
                        .await;
                    return ScreenedFile {
                        filename: file.filename,
                        content_type,
                        data: clean,
                        valid: true,
                        sanitized: true,
                        errors: Vec::new(),
                    };
                }
                Err(e) => {
                    // A file we cannot sanitize is a hard error for that file
                    // only; the rest of the batch is unaffected.
                    self.audit
                        .log_security_event(
                            SecurityEvent::new(SecurityEventKind::UploadRejected, Severity::High)
                                .with_ip(ip)
                                .detail("filename", &file.filename)
                                .detail("reason", "sanitization failed"),
                        )
                        .await;
                    return ScreenedFile {
                        filename: file.filename,
                        content_type: file.content_type,
                        data: Vec::new(),
                        valid: false,
                        sanitized: false,
                        errors: vec![e.to_string()],
                    };
                }
            }
        }

        ScreenedFile {
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
            valid: true,
            sanitized: false,
            errors: Vec::new(),
        }
    }

    /// Magic-number check for the image types the platform accepts.
    fn signature_matches(content_type: &str, data: &[u8]) -> bool {
        match content_type.to_ascii_lowercase().as_str() {
            "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
            "image/webp" => {
                data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
            }
            _ => true,
        }
    }
}
