// =====================================================================================
// UPLOAD CELL INTEGRATION TESTS - GUARD, SIGNATURES, SANITIZATION
// =====================================================================================

use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use image::{ImageFormat, RgbaImage};

use audit_cell::AuditService;
use shared_crypto::CryptoService;
use shared_store::Store;
use upload_cell::{ImageSanitizer, UploadGuardService, UploadPolicy, UploadedFile};

fn guard() -> UploadGuardService {
    UploadGuardService::new(
        Store::memory(),
        Arc::new(CryptoService::new(&CryptoService::generate_master_key())),
        Arc::new(AuditService::new(100)),
        UploadPolicy::default(),
    )
}

fn png_bytes() -> Vec<u8> {
    let img = RgbaImage::from_pixel(8, 8, image::Rgba([120, 180, 90, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn png_file(filename: &str) -> UploadedFile {
    UploadedFile {
        filename: filename.to_string(),
        content_type: "image/png".to_string(),
        data: png_bytes(),
    }
}

// =====================================================================================
// PER-FILE CHECKS
// =====================================================================================

#[tokio::test]
async fn clean_png_is_admitted_untouched() {
    let result = guard()
        .validate_upload(vec![png_file("pool.png")], "10.4.4.4", None)
        .await;
    assert!(result.valid);
    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].valid);
    assert!(!result.files[0].sanitized);
    assert!(!result.files[0].data.is_empty());
}

#[tokio::test]
async fn script_tag_in_filename_rejects_despite_valid_content() {
    let result = guard()
        .validate_upload(vec![png_file("evil<script>.png")], "10.4.4.4", None)
        .await;
    assert!(!result.valid);
    assert!(result.files[0]
        .errors
        .iter()
        .any(|e| e.contains("suspicious")));
}

#[tokio::test]
async fn traversal_filenames_are_rejected() {
    for name in ["../../etc/passwd.png", "photo%2e%2e%2fescape.png"] {
        let result = guard()
            .validate_upload(vec![png_file(name)], "10.4.4.4", None)
            .await;
        assert!(!result.valid, "{} should be rejected", name);
    }
}

#[tokio::test]
async fn executable_extensions_are_blocked() {
    let file = UploadedFile {
        filename: "setup.exe".to_string(),
        content_type: "image/png".to_string(),
        data: png_bytes(),
    };
    let result = guard().validate_upload(vec![file], "10.4.4.4", None).await;
    assert!(!result.valid);
    let errors = &result.files[0].errors;
    // Both the allow-list and the independent executable blocklist fire.
    assert!(errors.iter().any(|e| e.contains("not allowed")));
    assert!(errors.iter().any(|e| e.contains("blocked")));
}

#[tokio::test]
async fn declared_type_must_match_magic_bytes() {
    let file = UploadedFile {
        filename: "photo.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        // PNG bytes behind a JPEG declaration.
        data: png_bytes(),
    };
    let result = guard().validate_upload(vec![file], "10.4.4.4", None).await;
    assert!(!result.valid);
    assert!(result.files[0]
        .errors
        .iter()
        .any(|e| e.contains("does not match")));
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let mut policy = UploadPolicy::default();
    policy.max_file_size = 64;
    let guard = UploadGuardService::new(
        Store::memory(),
        Arc::new(CryptoService::new(&CryptoService::generate_master_key())),
        Arc::new(AuditService::new(100)),
        policy,
    );

    let result = guard
        .validate_upload(vec![png_file("big.png")], "10.4.4.4", None)
        .await;
    assert!(!result.valid);
    assert!(result.files[0].errors.iter().any(|e| e.contains("size")));
}

// =====================================================================================
// POLYGLOT DETECTION & SANITIZATION
// =====================================================================================

#[tokio::test]
async fn polyglot_that_cannot_be_reencoded_is_a_per_file_error() {
    // Valid GIF signature with a script payload instead of image data: the
    // scan flags it, re-encoding fails, and only this file errors out.
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(b"<script>document.cookie</script>");
    let polyglot = UploadedFile {
        filename: "banner.gif".to_string(),
        content_type: "image/gif".to_string(),
        data,
    };

    let result = guard()
        .validate_upload(vec![polyglot, png_file("pool.png")], "10.4.4.4", None)
        .await;
    assert!(!result.valid);
    assert!(!result.files[0].valid);
    assert!(result.files[0]
        .errors
        .iter()
        .any(|e| e.to_lowercase().contains("sanitization")));
    // The clean file in the same batch is unaffected.
    assert!(result.files[1].valid);
}

#[test]
fn reencode_strips_everything_but_pixels() {
    let file = png_file("pool.png");
    let (clean, content_type) = ImageSanitizer::re_encode(&file).unwrap();
    assert_eq!(content_type, "image/png");
    let reloaded = image::load_from_memory(&clean).unwrap();
    assert_eq!(reloaded.width(), 8);
    assert_eq!(reloaded.height(), 8);
}

#[test]
fn reencode_failure_for_non_image_bytes() {
    let file = UploadedFile {
        filename: "junk.png".to_string(),
        content_type: "image/png".to_string(),
        data: vec![0u8; 32],
    };
    assert!(ImageSanitizer::re_encode(&file).is_err());
}

// =====================================================================================
// BATCH RULES
// =====================================================================================

#[tokio::test]
async fn batch_size_cap() {
    let files: Vec<UploadedFile> = (0..6).map(|i| png_file(&format!("p{}.png", i))).collect();
    let result = guard().validate_upload(files, "10.4.4.4", None).await;
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.contains("at most")));
    assert!(result.files.is_empty());
}

#[tokio::test]
async fn rolling_hour_upload_limit() {
    let guard = guard();
    let now = Utc::now();

    for i in 0..10 {
        let at = now + chrono::Duration::minutes(i * 2);
        let result = guard
            .validate_upload_at(vec![png_file("p.png")], "10.5.5.5", None, at)
            .await;
        assert!(result.valid, "upload {} should be admitted", i);
    }

    // Eleventh within the hour: the whole batch is refused.
    let result = guard
        .validate_upload_at(
            vec![png_file("p.png")],
            "10.5.5.5",
            None,
            now + chrono::Duration::minutes(21),
        )
        .await;
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.contains("limit")));

    // An hour of silence resets the counter.
    let result = guard
        .validate_upload_at(
            vec![png_file("p.png")],
            "10.5.5.5",
            None,
            now + chrono::Duration::minutes(21) + chrono::Duration::minutes(61),
        )
        .await;
    assert!(result.valid);

    // Other clients are unaffected throughout.
    let result = guard
        .validate_upload_at(vec![png_file("p.png")], "10.6.6.6", None, now)
        .await;
    assert!(result.valid);
}

// =====================================================================================
// CONTENT-HASH DENYLIST
// =====================================================================================

#[tokio::test]
async fn blocked_content_hash_rejects_any_filename() {
    let guard = guard();
    let data = png_bytes();
    let hash = guard.calculate_file_hash(&data);
    assert_eq!(hash.len(), 64);

    assert!(!guard.is_file_hash_blocked(&hash).await);
    guard.block_file_hash(&hash, "reported content").await;
    assert!(guard.is_file_hash_blocked(&hash).await);

    // Same bytes under a fresh name are still refused.
    let result = guard
        .validate_upload(vec![png_file("renamed.png")], "10.4.4.4", None)
        .await;
    assert!(!result.valid);
    assert!(result.files[0]
        .errors
        .iter()
        .any(|e| e.contains("denylist")));
}
