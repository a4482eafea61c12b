use std::io::Cursor;
use std::sync::atomic::AtomicU32;
use std::time::{Duration, Instant};

use super::*;

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn drain_until(loader: &AssetLoader, n: usize) -> Vec<AssetEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut out = Vec::new();
    while out.len() < n && Instant::now() < deadline {
        out.extend(loader.poll_events());
        std::thread::sleep(Duration::from_millis(2));
    }
    out
}

struct Flaky {
    failures_left: AtomicU32,
    calls: AtomicU32,
    bytes: Vec<u8>,
}

impl AssetSource for Flaky {
    fn fetch(&self, _reference: &str) -> AdResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AdError::asset("transient"));
        }
        Ok(self.bytes.clone())
    }
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn dir_source_strips_scheme_and_host() {
    let src = DirSource::new("/mirror");
    assert_eq!(
        src.resolve("https://cdn.example.net/templates/a_mask.png?v=2")
            .unwrap(),
        PathBuf::from("/mirror/templates/a_mask.png")
    );
    assert_eq!(
        src.resolve("local/b.png").unwrap(),
        PathBuf::from("/mirror/local/b.png")
    );
    assert!(src.resolve("https://cdn.example.net/").is_err());
    assert!(src.resolve("https://cdn.example.net/../etc/passwd").is_err());
}

#[test]
fn load_from_url_reaches_ready_and_emits_event() {
    let source = MemorySource::new().with("mask.png", png(4, 2, [0, 255, 0, 255]));
    let loader = AssetLoader::new(Arc::new(source), LoaderOpts::default()).unwrap();

    let handle = loader.load_from_url("mask.png");
    let state = handle.wait();
    let img = state.ready().expect("ready");
    assert_eq!((img.width(), img.height()), (4, 2));
    assert!(!handle.is_pending());

    let events = drain_until(&loader, 1);
    assert_eq!(
        events,
        vec![AssetEvent {
            id: handle.id(),
            ok: true
        }]
    );
}

#[test]
fn missing_and_undecodable_assets_fail_observably() {
    let source = MemorySource::new().with("junk.png", b"not an image".to_vec());
    let loader = AssetLoader::new(Arc::new(source), LoaderOpts::default()).unwrap();

    let missing = loader.load_from_url("nope.png");
    let junk = loader.load_from_url("junk.png");
    let user = loader.load_from_user_file(vec![1, 2, 3]);

    assert!(missing.wait().is_failed());
    assert!(junk.wait().is_failed());
    assert!(user.wait().is_failed());
    assert!(missing.ready().is_none());
    assert_eq!(user.label(), "<user file>");

    let events = drain_until(&loader, 3);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| !e.ok));
}

#[test]
fn fetch_is_retried_up_to_budget() {
    let flaky = Arc::new(Flaky {
        failures_left: AtomicU32::new(2),
        calls: AtomicU32::new(0),
        bytes: png(1, 1, [9, 9, 9, 255]),
    });
    let loader = AssetLoader::new(
        flaky.clone(),
        LoaderOpts::default().with_fetch_attempts(3),
    )
    .unwrap();
    assert!(loader.load_from_url("x").wait().ready().is_some());
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);

    let flaky = Arc::new(Flaky {
        failures_left: AtomicU32::new(5),
        calls: AtomicU32::new(0),
        bytes: png(1, 1, [9, 9, 9, 255]),
    });
    let loader = AssetLoader::new(flaky.clone(), LoaderOpts::default()).unwrap();
    assert!(loader.load_from_url("x").wait().is_failed());
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn loader_opts_are_validated() {
    let source: Arc<dyn AssetSource> = Arc::new(MemorySource::new());
    assert!(AssetLoader::new(source.clone(), LoaderOpts::default().with_workers(0)).is_err());
    assert!(AssetLoader::new(source, LoaderOpts::default().with_fetch_attempts(0)).is_err());
}

#[test]
fn ids_are_unique_per_request() {
    let source = MemorySource::new().with("a", png(1, 1, [0, 0, 0, 255]));
    let loader = AssetLoader::new(Arc::new(source), LoaderOpts::default()).unwrap();
    let a = loader.load_from_url("a");
    let b = loader.load_from_url("a");
    assert_ne!(a.id(), b.id());
    a.wait();
    b.wait();
}

#[test]
fn event_is_queued_once_wait_returns() {
    let source = MemorySource::new().with("a.png", png(1, 1, [1, 2, 3, 255]));
    let loader = AssetLoader::new(Arc::new(source), LoaderOpts::default()).unwrap();
    for _ in 0..20 {
        let ok = loader.load_from_url("a.png");
        let bad = loader.load_from_user_file(b"nope".to_vec());
        ok.wait();
        bad.wait();
        let mut ids: Vec<_> = loader.poll_events().into_iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.0);
        assert_eq!(ids, vec![ok.id(), bad.id()]);
    }
}
