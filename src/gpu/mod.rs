mod camera;
mod mesh;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
use mesh::{Mesh, MeshVertex};

use crate::config::{srgb_to_linear, OrnamentGroupConfig};
use crate::error::GpuError;
use crate::foliage::FoliageGpu;
use crate::ornaments::InstanceTransform;
use crate::scene::Scene;
use crate::shaders::{FoliageUniforms, OrnamentUniforms, FOLIAGE_WGSL, ORNAMENT_WGSL};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const EMISSIVE_INTENSITY: f32 = 0.2;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.004,
    b: 0.002,
    a: 1.0,
};

struct FoliagePass {
    pipeline: wgpu::RenderPipeline,
    particle_buffer: wgpu::Buffer,
    num_particles: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    colors: [[f32; 4]; 3],
    point_scale: f32,
}

struct OrnamentPass {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    num_instances: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 4],
    material: [f32; 4],
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    foliage: FoliagePass,
    ornament_pipeline: wgpu::RenderPipeline,
    ornaments: Vec<OrnamentPass>,
    model: Mat4,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        tracing::info!(adapter = %adapter.get_info().name, "gpu ready");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);
        let uniform_layout = create_uniform_layout(&device);

        let foliage = create_foliage_pass(&device, &config, &uniform_layout, scene);
        let ornament_pipeline = create_ornament_pipeline(&device, &config, &uniform_layout);
        let ornaments = scene
            .ornaments()
            .iter()
            .map(|group| {
                create_ornament_pass(&device, &uniform_layout, group.config(), group.transforms())
            })
            .collect();

        let model = Mat4::from_translation(Vec3::new(0.0, scene.config().root_offset, 0.0));

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            foliage,
            ornament_pipeline,
            ornaments,
            model,
            camera: Camera::new(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn update_uniforms(&mut self, scene: &mut Scene) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let view = self.camera.view_matrix();
        let view_proj = self.camera.projection_matrix(aspect) * view;
        let frame = scene.foliage().frame();

        let [color_high, color_low, color_gold] = self.foliage.colors;
        let foliage_uniforms = FoliageUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            model: self.model.to_cols_array_2d(),
            color_high,
            color_low,
            color_gold,
            time: frame.time,
            progress: frame.progress,
            point_scale: self.foliage.point_scale,
            _padding0: 0.0,
            viewport: [self.config.width as f32, self.config.height as f32],
            _padding1: [0.0; 2],
        };
        self.queue.write_buffer(
            &self.foliage.uniform_buffer,
            0,
            bytemuck::bytes_of(&foliage_uniforms),
        );

        let camera_pos = self.camera.position().extend(1.0).to_array();
        for (pass, group) in self.ornaments.iter().zip(scene.ornaments_mut()) {
            let uniforms = OrnamentUniforms {
                view_proj: view_proj.to_cols_array_2d(),
                model: self.model.to_cols_array_2d(),
                camera_pos,
                color: pass.color,
                material: pass.material,
            };
            self.queue
                .write_buffer(&pass.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

            if let Some(transforms) = group.take_dirty_transforms() {
                self.queue
                    .write_buffer(&pass.instance_buffer, 0, bytemuck::cast_slice(transforms));
            }
        }
    }

    pub fn render(&mut self, scene: &mut Scene) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(scene);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Opaque ornaments first so the additive foliage is depth tested against them.
            render_pass.set_pipeline(&self.ornament_pipeline);
            for pass in &self.ornaments {
                render_pass.set_bind_group(0, &pass.bind_group, &[]);
                render_pass.set_vertex_buffer(0, pass.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, pass.instance_buffer.slice(..));
                render_pass.set_index_buffer(pass.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..pass.index_count, 0, 0..pass.num_instances);
            }

            render_pass.set_pipeline(&self.foliage.pipeline);
            render_pass.set_bind_group(0, &self.foliage.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.foliage.particle_buffer.slice(..));
            render_pass.draw(0..6, 0..self.foliage.num_particles);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn linear_rgba(color: [f32; 3]) -> [f32; 4] {
    let [r, g, b] = srgb_to_linear(color);
    [r, g, b, 1.0]
}

fn create_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Uniform Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_uniform_binding<T: bytemuck::Pod>(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    initial: &T,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(initial),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (buffer, bind_group)
}

fn create_foliage_pass(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    uniform_layout: &wgpu::BindGroupLayout,
    scene: &Scene,
) -> FoliagePass {
    let particles = scene.foliage().gpu_particles();
    let particle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Foliage Buffer"),
        contents: bytemuck::cast_slice(&particles),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let (uniform_buffer, bind_group) = create_uniform_binding(
        device,
        uniform_layout,
        "Foliage Uniforms",
        &<FoliageUniforms as bytemuck::Zeroable>::zeroed(),
    );

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Foliage Shader"),
        source: wgpu::ShaderSource::Wgsl(FOLIAGE_WGSL.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Foliage Pipeline Layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    let attributes = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3, // scatter
        },
        wgpu::VertexAttribute {
            offset: 12,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3, // assembled
        },
        wgpu::VertexAttribute {
            offset: 24,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32, // seed
        },
    ];

    let additive = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Foliage Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<FoliageGpu>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &attributes,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(additive),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let foliage_config = &scene.config().foliage;
    FoliagePass {
        pipeline,
        particle_buffer,
        num_particles: particles.len() as u32,
        uniform_buffer,
        bind_group,
        colors: [
            linear_rgba(foliage_config.color_high),
            linear_rgba(foliage_config.color_low),
            linear_rgba(foliage_config.color_gold),
        ],
        point_scale: foliage_config.point_scale,
    }
}

fn create_ornament_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    uniform_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Ornament Shader"),
        source: wgpu::ShaderSource::Wgsl(ORNAMENT_WGSL.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Ornament Pipeline Layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    let mesh_attributes = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    let instance_attributes = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4
    ];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Ornament Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &mesh_attributes,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceTransform>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &instance_attributes,
                },
            ],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_ornament_pass(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    group: &OrnamentGroupConfig,
    transforms: &[InstanceTransform],
) -> OrnamentPass {
    let mesh = Mesh::for_kind(group.kind);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Ornament Mesh Vertices"),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Ornament Mesh Indices"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Ornament Instances"),
        contents: bytemuck::cast_slice(transforms),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    });

    let (uniform_buffer, bind_group) = create_uniform_binding(
        device,
        uniform_layout,
        "Ornament Uniforms",
        &<OrnamentUniforms as bytemuck::Zeroable>::zeroed(),
    );

    tracing::debug!(group = %group.name, instances = transforms.len(), "ornament pass created");

    OrnamentPass {
        vertex_buffer,
        index_buffer,
        index_count: mesh.index_count(),
        instance_buffer,
        num_instances: transforms.len() as u32,
        uniform_buffer,
        bind_group,
        color: linear_rgba(group.color),
        material: [group.metallic, group.roughness, EMISSIVE_INTENSITY, 0.0],
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
