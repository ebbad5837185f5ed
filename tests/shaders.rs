//! WGSL validation and layout checks.
//!
//! Both shaders go through naga's WGSL front end and validator, the same
//! checks wgpu runs when it builds the pipelines, so a broken shader fails
//! here instead of at window creation.

use arix::foliage::{FoliageGpu, SEED_DELAY};
use arix::ornaments::InstanceTransform;
use arix::shaders::{FoliageUniforms, OrnamentUniforms, FOLIAGE_WGSL, ORNAMENT_WGSL};
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

fn parse_and_validate(source: &str) -> naga::Module {
    let module = match wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("parse error:\n{}", e.emit_to_string(source)),
    };
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    if let Err(e) = validator.validate(&module) {
        panic!("validation error: {e:?}");
    }
    module
}

fn uniform_block_size(module: &naga::Module) -> u32 {
    let (_, global) = module
        .global_variables
        .iter()
        .find(|(_, var)| var.name.as_deref() == Some("uniforms"))
        .expect("shader declares `uniforms`");
    match &module.types[global.ty].inner {
        naga::TypeInner::Struct { span, .. } => *span,
        other => panic!("uniforms is not a struct: {other:?}"),
    }
}

fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.name.as_str(), ep.stage))
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_foliage_shader_validates() {
    let module = parse_and_validate(FOLIAGE_WGSL);
    assert_eq!(
        entry_points(&module),
        vec![
            ("vs_main", naga::ShaderStage::Vertex),
            ("fs_main", naga::ShaderStage::Fragment),
        ]
    );
}

#[test]
fn test_ornament_shader_validates() {
    let module = parse_and_validate(ORNAMENT_WGSL);
    assert_eq!(
        entry_points(&module),
        vec![
            ("vs_main", naga::ShaderStage::Vertex),
            ("fs_main", naga::ShaderStage::Fragment),
        ]
    );
}

// ============================================================================
// Layouts
// ============================================================================

#[test]
fn test_foliage_uniforms_match_wgsl() {
    let module = parse_and_validate(FOLIAGE_WGSL);
    assert_eq!(
        uniform_block_size(&module) as usize,
        std::mem::size_of::<FoliageUniforms>()
    );
}

#[test]
fn test_ornament_uniforms_match_wgsl() {
    let module = parse_and_validate(ORNAMENT_WGSL);
    assert_eq!(
        uniform_block_size(&module) as usize,
        std::mem::size_of::<OrnamentUniforms>()
    );
}

#[test]
fn test_vertex_buffer_strides() {
    // Matches the Float32x3, Float32x3, Float32 attributes of the foliage pipeline.
    assert_eq!(std::mem::size_of::<FoliageGpu>(), 28);
    assert_eq!(std::mem::offset_of!(FoliageGpu, assembled), 12);
    assert_eq!(std::mem::offset_of!(FoliageGpu, seed), 24);
    // Four Float32x4 columns.
    assert_eq!(std::mem::size_of::<InstanceTransform>(), 64);
}

// ============================================================================
// CPU / shader agreement
// ============================================================================

#[test]
fn test_shader_uses_same_interpolation_constants() {
    assert_eq!(SEED_DELAY, 0.2);
    for fragment in [
        "(uniforms.progress - seed * 0.2) / 0.8",
        "mix(scatter_pos, tree_pos, eased)",
        "sin(uniforms.time * 2.0 + seed * 10.0) * 0.1",
        "sin(uniforms.time * 0.5 + scatter_pos.x) * (1.0 - eased) * 0.5",
        "mix(15.0, 10.0, eased)",
        "sin(uniforms.time * 3.0 + in.seed * 20.0) * 0.5 + 0.5",
        "in.seed > 0.85",
    ] {
        assert!(
            FOLIAGE_WGSL.contains(fragment),
            "foliage shader is missing `{fragment}`"
        );
    }
}

#[test]
fn test_shader_ease_matches_cpu_ease() {
    // Both branches of the WGSL ease, spelled the same way as the CPU one.
    assert!(FOLIAGE_WGSL.contains("return 4.0 * x * x * x;"));
    assert!(FOLIAGE_WGSL.contains("return 1.0 - pow(-2.0 * x + 2.0, 3.0) / 2.0;"));
    assert_eq!(arix::foliage::cubic_ease_in_out(0.25), 4.0 * 0.25 * 0.25 * 0.25);
    assert_eq!(arix::foliage::cubic_ease_in_out(0.75), 1.0 - 0.5f32.powi(3) / 2.0);
}
