//! Integration tests for drydock-resolver.
//!
//! These tests verify end-to-end behavior across modules: resolution,
//! execution, requirement extraction, conversion, and plan reporting, using
//! the kinds of types a plugin host would register.

use std::sync::Arc;

use anyhow::Result;
use drydock_resolver::{Catalog, Converter, Func, Slot, SlotKey, Value};

#[derive(Clone, Debug, PartialEq)]
struct SourceDir(&'static str);

#[derive(Clone, Debug, PartialEq)]
struct Artifact {
    image: String,
}

#[derive(Clone, Debug, PartialEq)]
struct PushedImage {
    reference: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Release {
    url: String,
}

trait Registry: Send + Sync {
    fn host(&self) -> &'static str;
}

struct LocalRegistry;

impl Registry for LocalRegistry {
    fn host(&self) -> &'static str {
        "registry.local"
    }
}

fn pipeline_catalog() -> Catalog {
    Catalog::builder()
        .register(Func::new("builder", |src: SourceDir| {
            Ok(Artifact {
                image: format!("img:{}", src.0),
            })
        }))
        .register(Func::new("pusher", |a: Artifact, r: Arc<dyn Registry>| {
            Ok(PushedImage {
                reference: format!("{}/{}", r.host(), a.image),
            })
        }))
        .build()
}

/// Test the full builder -> pusher -> platform pipeline from one seed and a
/// registry facet.
#[test]
fn test_end_to_end_pipeline() {
    let catalog = pipeline_catalog();
    let platform = Func::new("platform", |img: PushedImage| {
        Ok(Release {
            url: format!("https://{}", img.reference),
        })
    });

    let registry: Arc<dyn Registry> = Arc::new(LocalRegistry);
    let seeds = vec![
        Value::new(SourceDir("svc")),
        Value::new(0_u8).with_facet(registry),
    ];

    let chain = catalog.chain(&platform, seeds).expect("pipeline resolves");
    assert_eq!(chain.len(), 3, "chain: {}", chain);

    let result = chain.call().expect("pipeline executes");
    let release = result.downcast_ref::<Release>().expect("release produced");
    assert_eq!(release.url, "https://registry.local/img:svc");
}

/// Test that the input set names exactly what the caller must supply for
/// the same pipeline, and that supplying it makes resolution succeed.
#[test]
fn test_input_set_matches_chain_requirements() {
    let catalog = pipeline_catalog();
    let platform = Func::new("platform", |img: PushedImage| Ok(img.reference));

    let suppliable = [SlotKey::of::<SourceDir>(), SlotKey::of::<Arc<dyn Registry>>()];
    let required = catalog
        .input_set(&platform, |slot| suppliable.contains(&slot.key()))
        .expect("requirements computable");

    let keys: Vec<SlotKey> = required.iter().map(|slot| slot.key()).collect();
    assert!(keys.contains(&SlotKey::of::<SourceDir>()));
    assert!(keys.contains(&SlotKey::of::<Arc<dyn Registry>>()));
    assert_eq!(keys.len(), 2);

    let registry: Arc<dyn Registry> = Arc::new(LocalRegistry);
    let seeds = vec![
        Value::new(SourceDir("svc")),
        Value::new(registry),
    ];
    let chain = catalog.chain(&platform, seeds).expect("seeded resolution");
    let result = chain.call().expect("executes");
    assert_eq!(
        result.downcast_ref::<String>().unwrap(),
        "registry.local/img:svc"
    );
}

/// Test bulk conversion over the same catalog.
#[test]
fn test_converter_slice() {
    let set = Converter::new(
        Catalog::builder()
            .register(Func::new("builder", |src: SourceDir| {
                Ok(Artifact {
                    image: format!("img:{}", src.0),
                })
            }))
            .build(),
    );

    let artifacts: Vec<Artifact> = set
        .convert_slice(vec![
            Value::new(SourceDir("api")),
            Value::new(SourceDir("web")),
        ])
        .expect("all sources convert");

    assert_eq!(artifacts[0].image, "img:api");
    assert_eq!(artifacts[1].image, "img:web");
}

/// Test that a chain plan serializes with steps in call order.
#[test]
fn test_plan_serialization() {
    let catalog = pipeline_catalog();
    let platform = Func::new("platform", |img: PushedImage| Ok(img.reference));

    let registry: Arc<dyn Registry> = Arc::new(LocalRegistry);
    let seeds = vec![Value::new(SourceDir("svc")), Value::new(registry)];
    let chain = catalog.chain(&platform, seeds).expect("pipeline resolves");

    let plan = chain.plan();
    let json = serde_json::to_value(&plan).expect("plan serializes");

    assert_eq!(json["target"], "platform");
    let steps = json["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["func"], "builder");
    assert_eq!(steps[1]["func"], "pusher");
    assert_eq!(steps[2]["func"], "platform");
}

/// Test concurrent resolutions against one shared catalog.
#[test]
fn test_concurrent_resolution() {
    let catalog = pipeline_catalog();
    let catalog = &catalog;

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for n in 0..4 {
            handles.push(scope.spawn(move || -> Result<String> {
                let platform = Func::new("platform", |img: PushedImage| Ok(img.reference));
                let registry: Arc<dyn Registry> = Arc::new(LocalRegistry);
                let seeds = vec![
                    Value::new(SourceDir(if n % 2 == 0 { "api" } else { "web" })),
                    Value::new(registry),
                ];
                catalog.chain(&platform, seeds)?.call()?.downcast_ref::<String>()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("not a string"))
            }));
        }
        for handle in handles {
            let reference = handle.join().expect("thread completes").expect("resolves");
            assert!(reference.starts_with("registry.local/img:"), "got {}", reference);
        }
    });
}
