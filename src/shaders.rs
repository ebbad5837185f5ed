//! WGSL for the two render passes, with the matching uniform layouts.
//!
//! The foliage vertex shader is the GPU side of
//! [`FoliageParticle::position_at`](crate::foliage::FoliageParticle::position_at);
//! the two must change together.

use bytemuck::{Pod, Zeroable};

/// Uniform block of [`FOLIAGE_WGSL`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FoliageUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color_high: [f32; 4],
    pub color_low: [f32; 4],
    pub color_gold: [f32; 4],
    pub time: f32,
    pub progress: f32,
    pub point_scale: f32,
    pub _padding0: f32,
    pub viewport: [f32; 2],
    pub _padding1: [f32; 2],
}

/// Uniform block of [`ORNAMENT_WGSL`], one per ornament group.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OrnamentUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub color: [f32; 4],
    /// x = metallic, y = roughness, z = emissive intensity.
    pub material: [f32; 4],
}

/// Instanced point sprites. Vertex buffer per instance: scatter position,
/// assembled position, seed.
pub const FOLIAGE_WGSL: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    color_high: vec4<f32>,
    color_low: vec4<f32>,
    color_gold: vec4<f32>,
    time: f32,
    progress: f32,
    point_scale: f32,
    _padding0: f32,
    viewport: vec2<f32>,
    _padding1: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) seed: f32,
};

fn ease_in_out_cubic(x: f32) -> f32 {
    if x < 0.5 {
        return 4.0 * x * x * x;
    }
    return 1.0 - pow(-2.0 * x + 2.0, 3.0) / 2.0;
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) scatter_pos: vec3<f32>,
    @location(1) tree_pos: vec3<f32>,
    @location(2) seed: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];

    // Later seeds start later so the morph ripples through the cloud.
    let local_progress = clamp((uniforms.progress - seed * 0.2) / 0.8, 0.0, 1.0);
    let eased = ease_in_out_cubic(local_progress);

    var pos = mix(scatter_pos, tree_pos, eased);
    let breathe = sin(uniforms.time * 2.0 + seed * 10.0) * 0.1;
    let float_y = sin(uniforms.time * 0.5 + scatter_pos.x) * (1.0 - eased) * 0.5;
    pos.y += breathe + float_y;

    let world = uniforms.model * vec4<f32>(pos, 1.0);
    let view_pos = uniforms.view * world;
    let depth = max(-view_pos.z, 0.001);
    let size_px = mix(15.0, 10.0, eased) * uniforms.point_scale / depth;

    var clip = uniforms.view_proj * world;
    let offset = corner * size_px / uniforms.viewport * clip.w;
    clip.x += offset.x;
    clip.y += offset.y;

    var out: VertexOutput;
    out.clip_position = clip;
    out.uv = corner;
    out.seed = seed;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv) * 0.5;
    if dist > 0.5 {
        discard;
    }
    let strength = pow(1.0 - dist * 2.0, 2.0);

    let twinkle = sin(uniforms.time * 3.0 + in.seed * 20.0) * 0.5 + 0.5;
    var color = mix(uniforms.color_low.rgb, uniforms.color_high.rgb, in.seed);
    if in.seed > 0.85 {
        color = mix(color, uniforms.color_gold.rgb, twinkle * 0.8);
    }
    return vec4<f32>(color, strength);
}
"#;

/// Instanced lit meshes. Slot 0: position + normal. Slot 1: per-instance
/// transform columns.
pub const ORNAMENT_WGSL: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_pos: vec4<f32>,
    color: vec4<f32>,
    material: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

const AMBIENT: vec3<f32> = vec3<f32>(0.03, 0.07, 0.05);
const KEY_LIGHT_POS: vec3<f32> = vec3<f32>(10.0, 20.0, 10.0);
const KEY_LIGHT_COLOR: vec3<f32> = vec3<f32>(1.6, 1.35, 0.4);
const FILL_LIGHT_POS: vec3<f32> = vec3<f32>(-10.0, 0.0, -10.0);
const FILL_LIGHT_COLOR: vec3<f32> = vec3<f32>(0.0, 0.6, 0.32);
const RIM_LIGHT_POS: vec3<f32> = vec3<f32>(0.0, 10.0, -20.0);
const RIM_LIGHT_COLOR: vec3<f32> = vec3<f32>(0.8, 0.8, 0.8);

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) col0: vec4<f32>,
    @location(3) col1: vec4<f32>,
    @location(4) col2: vec4<f32>,
    @location(5) col3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let instance_matrix = mat4x4<f32>(instance.col0, instance.col1, instance.col2, instance.col3);
    let world = uniforms.model * instance_matrix * vec4<f32>(vertex.position, 1.0);
    // Instance scale is uniform, so the upper 3x3 transforms normals correctly.
    let normal_matrix = mat3x3<f32>(instance.col0.xyz, instance.col1.xyz, instance.col2.xyz);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normalize(normal_matrix * vertex.normal);
    return out;
}

fn shade(
    n: vec3<f32>,
    v: vec3<f32>,
    l: vec3<f32>,
    light: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
) -> vec3<f32> {
    let n_dot_l = max(dot(n, l), 0.0);
    let h = normalize(l + v);
    let spec = pow(max(dot(n, h), 0.0), shininess) * select(0.0, 1.0, n_dot_l > 0.0);
    return light * (diffuse * n_dot_l + specular * spec);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let v = normalize(uniforms.camera_pos.xyz - in.world_pos);
    let base = uniforms.color.rgb;
    let metallic = uniforms.material.x;
    let roughness = uniforms.material.y;

    let shininess = mix(256.0, 4.0, roughness);
    let specular = mix(vec3<f32>(0.04), base, metallic);
    let diffuse = base * mix(1.0, 0.35, metallic);

    var color = AMBIENT * base;
    color += shade(n, v, normalize(KEY_LIGHT_POS - in.world_pos), KEY_LIGHT_COLOR, diffuse, specular, shininess);
    color += shade(n, v, normalize(FILL_LIGHT_POS - in.world_pos), FILL_LIGHT_COLOR, diffuse, specular, shininess);
    color += shade(n, v, normalize(RIM_LIGHT_POS - in.world_pos), RIM_LIGHT_COLOR, diffuse, specular, shininess);
    color += base * uniforms.material.z;
    return vec4<f32>(color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FoliageUniforms>(), 272);
        assert_eq!(std::mem::size_of::<OrnamentUniforms>(), 176);
    }

    #[test]
    fn test_entry_points_present() {
        for src in [FOLIAGE_WGSL, ORNAMENT_WGSL] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }
}
