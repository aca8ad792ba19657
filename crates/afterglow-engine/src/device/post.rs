//! wgpu implementation of the post-processing backend.
//!
//! Every stage is a fullscreen triangle with one bind group:
//! `0` input texture, `1` linear clamp sampler, `2` the stage's uniform buffer.

use crate::post::{Backend, CompileError, Extent, GpuContext, ResourceError, ShaderStage, TargetKind, UniformLayout};
use crate::post::builtin::FULLSCREEN_VERTEX;
use crate::post::shader::{FRAGMENT_ENTRY, INPUT_TEXTURE_BINDING, SAMPLER_BINDING, UNIFORM_BINDING, VERTEX_ENTRY};

use super::{Gpu, GpuFrame};

/// Depth attachment format of the scene target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Marker type selecting the wgpu resource types.
pub struct Wgpu;

impl Backend for Wgpu {
    type Target = OffscreenTarget;
    type Program = StageProgram;
    type Frame = GpuFrame;

    fn target_extent(target: &OffscreenTarget) -> Extent {
        target.extent
    }
}

/// Offscreen color target, with a depth attachment when it receives the scene.
pub struct OffscreenTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    depth: Option<wgpu::TextureView>,
    extent: Extent,
}

impl OffscreenTarget {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }
}

pub struct StageProgram {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
}

/// Device objects shared by every stage and the present pass.
pub(super) struct PostKit {
    sampler: wgpu::Sampler,
    stage_bgl: wgpu::BindGroupLayout,
    stage_layout: wgpu::PipelineLayout,
    present_bgl: wgpu::BindGroupLayout,
    present_pipeline: wgpu::RenderPipeline,
}

impl PostKit {
    pub(super) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("afterglow post sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let stage_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("afterglow stage bgl"),
            entries: &[
                texture_entry(INPUT_TEXTURE_BINDING),
                sampler_entry(SAMPLER_BINDING),
                wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        // Sized per stage.
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let stage_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("afterglow stage pipeline layout"),
            bind_group_layouts: &[&stage_bgl],
            immediate_size: 0,
        });

        let present_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("afterglow present bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let present_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("afterglow present pipeline layout"),
            bind_group_layouts: &[&present_bgl],
            immediate_size: 0,
        });

        let vertex = shader_module(device, "afterglow fullscreen vertex", FULLSCREEN_VERTEX);
        let fragment = shader_module(device, "afterglow present fragment", include_str!("shaders/present.wgsl"));
        let present_pipeline = fullscreen_pipeline(
            device,
            "afterglow present pipeline",
            &present_layout,
            &vertex,
            &fragment,
            surface_format,
        );

        Self {
            sampler,
            stage_bgl,
            stage_layout,
            present_bgl,
            present_pipeline,
        }
    }
}

impl<'w> GpuContext<Wgpu> for Gpu<'w> {
    fn surface_extent(&self) -> Extent {
        let size = self.size();
        Extent::new(size.width, size.height)
    }

    fn resize_surface(&mut self, extent: Extent) {
        self.resize(winit::dpi::PhysicalSize::new(extent.width, extent.height));
    }

    fn create_target(
        &mut self,
        label: &'static str,
        kind: TargetKind,
        extent: Extent,
    ) -> Result<OffscreenTarget, ResourceError> {
        let max = self.device().limits().max_texture_dimension_2d;
        if extent.width > max || extent.height > max {
            return Err(ResourceError::TooLarge { label, requested: extent, max });
        }

        let format = self.offscreen_format();
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let features = self.adapter().get_texture_format_features(format);
        if !features.allowed_usages.contains(usage)
            || !features.flags.contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(ResourceError::Allocation {
                label,
                message: format!("{format:?} is not renderable and filterable on this adapter"),
            });
        }

        let size = wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = (kind == TargetKind::Scene).then(|| {
            self.device()
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("afterglow scene depth"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: DEPTH_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Ok(OffscreenTarget { _texture: texture, view, depth, extent })
    }

    fn compile_stage(
        &mut self,
        effect: &str,
        vertex_source: &str,
        fragment_source: &str,
        layout: &UniformLayout,
    ) -> Result<StageProgram, CompileError> {
        let device = self.device();
        let vertex = capture_validation(device, effect, ShaderStage::Vertex, || {
            shader_module(device, &format!("afterglow {effect} vertex"), vertex_source)
        })?;
        let fragment = capture_validation(device, effect, ShaderStage::Fragment, || {
            shader_module(device, &format!("afterglow {effect} fragment"), fragment_source)
        })?;

        // Interface and layout mismatches are reported against the effect's own source.
        let pipeline = capture_validation(device, effect, ShaderStage::Fragment, || {
            fullscreen_pipeline(
                device,
                &format!("afterglow {effect} pipeline"),
                &self.post.stage_layout,
                &vertex,
                &fragment,
                self.offscreen_format(),
            )
        })?;

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("afterglow {effect} uniforms")),
            size: layout.size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(StageProgram { pipeline, uniforms })
    }

    fn write_uniforms(&mut self, program: &StageProgram, bytes: &[u8]) {
        self.queue().write_buffer(&program.uniforms, 0, bytes);
    }

    fn run_stage(
        &mut self,
        frame: &mut GpuFrame,
        program: &StageProgram,
        input: &OffscreenTarget,
        output: &OffscreenTarget,
    ) {
        let bind_group = self.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("afterglow stage bind group"),
            layout: &self.post.stage_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: INPUT_TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&input.view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.post.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: program.uniforms.as_entire_binding(),
                },
            ],
        });

        draw_fullscreen(&mut frame.encoder, "afterglow stage pass", &output.view, &program.pipeline, &bind_group);
    }

    fn present(&mut self, frame: &mut GpuFrame, source: &OffscreenTarget) {
        let bind_group = self.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("afterglow present bind group"),
            layout: &self.post.present_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.post.sampler),
                },
            ],
        });

        draw_fullscreen(
            &mut frame.encoder,
            "afterglow present pass",
            &frame.view,
            &self.post.present_pipeline,
            &bind_group,
        );
    }
}

/// Runs `build` inside a validation error scope; a captured error becomes a `CompileError`.
fn capture_validation<T>(
    device: &wgpu::Device,
    effect: &str,
    shader: ShaderStage,
    build: impl FnOnce() -> T,
) -> Result<T, CompileError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(CompileError::new(effect, shader, err.to_string())),
        None => Ok(value),
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Records one pass that overwrites all of `target` with a fullscreen triangle.
fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    rpass.draw(0..3, 0..1);
}
