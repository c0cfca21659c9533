/// WGSL shader shared by the ground plane and the cube: one MVP uniform,
/// vertex color modulated by a sampled texture.
pub const SCENE_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
@group(0) @binding(1)
var scene_tex: texture_2d<f32>;
@group(0) @binding(2)
var scene_samp: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(scene_tex, scene_samp, in.uv);
    return vec4<f32>(in.color * texel.rgb, 1.0);
}
"#;
