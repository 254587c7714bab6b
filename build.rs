use std::cmp::Ordering;
use std::env;

// Instruction sets with a dedicated tile-kernel backend
#[derive(PartialEq, Eq, Debug)]
struct CpuFeature {
    name: &'static str,
    target_arch: &'static [&'static str],
    cfg_flag: &'static str,
    detected: bool,
}

impl CpuFeature {
    // Lowest number == Highest Priority
    fn priority(&self) -> usize {
        match self.name {
            "neon" => 0,
            "sse2" => 1,
            _ => usize::MAX,
        }
    }

    fn features() -> Vec<CpuFeature> {
        vec![
            CpuFeature {
                name: "sse2",
                target_arch: &["x86", "x86_64"],
                cfg_flag: "sse",
                detected: false,
            },
            CpuFeature {
                name: "neon",
                target_arch: &["aarch64"],
                cfg_flag: "neon",
                detected: false,
            },
        ]
    }
}

impl Ord for CpuFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for CpuFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reads the features cargo resolved for the *target*, so cross builds are
// configured for the machine the code will run on rather than the host.
struct TargetDetector {
    arch: String,
    features: Vec<String>,
}

impl TargetDetector {
    fn from_env() -> Self {
        let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
        let features = env::var("CARGO_CFG_TARGET_FEATURE")
            .unwrap_or_default()
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Self { arch, features }
    }

    fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    fn detect_features(&self, features: &mut [CpuFeature]) {
        for feature in features.iter_mut() {
            feature.detected =
                feature.target_arch.contains(&self.arch.as_str()) && self.has_feature(feature.name);
        }
    }

    // Scalar and vector code must agree on fused vs. split multiply-add.
    fn has_fused_madd(&self) -> bool {
        self.arch == "aarch64" || self.has_feature("fma")
    }
}

fn apply(features: &mut [CpuFeature], fused_madd: bool) {
    features.sort();

    // First detected feature wins; nothing detected means portable code
    let cfg_flag = features
        .iter()
        .find(|cpu_feature| cpu_feature.detected)
        .map(|cpu_feature| cpu_feature.cfg_flag)
        .unwrap_or("fallback");

    println!("cargo:rustc-cfg={cfg_flag}");

    if fused_madd && cfg_flag != "fallback" {
        println!("cargo:rustc-cfg=fused_madd");
    }

    println!("cargo::rustc-check-cfg=cfg(neon)");
    println!("cargo::rustc-check-cfg=cfg(sse)");
    println!("cargo::rustc-check-cfg=cfg(fallback)");
    println!("cargo::rustc-check-cfg=cfg(fused_madd)");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=DEPTHWISE_FORCE_FALLBACK");

    let mut features = CpuFeature::features();

    let force_fallback = env::var("DEPTHWISE_FORCE_FALLBACK")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let detector = TargetDetector::from_env();

    if !force_fallback {
        detector.detect_features(&mut features);
    }

    apply(&mut features, detector.has_fused_madd());
}
