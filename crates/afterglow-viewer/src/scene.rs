//! Demo scene: a spinning neon cube rendered into the pipeline's scene target.

use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use afterglow_engine::camera::PerspectiveCamera;
use afterglow_engine::device::{Gpu, GpuFrame, OffscreenTarget, DEPTH_FORMAT};

const SCENE_SHADER: &str = include_str!("shaders/scene.wgsl");

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub clear_color: wgpu::Color,
    /// Rotation speed in radians per second.
    pub spin_rate: f32,
    /// Direction towards the light, world space.
    pub light_direction: Vec3,
    pub ambient: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            spin_rate: 0.6,
            light_direction: Vec3::new(0.4, 0.8, 0.6),
            ambient: 0.35,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl SceneVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x3  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    light: [f32; 4],
}

/// Unit cube centered on the origin, one color per face.
pub fn cube_mesh() -> (Vec<SceneVertex>, Vec<u16>) {
    // (outward normal, any in-plane axis, neon color)
    let faces = [
        (Vec3::X, Vec3::Y, [1.0, 0.1, 0.6]),
        (Vec3::NEG_X, Vec3::Y, [0.1, 0.9, 1.0]),
        (Vec3::Y, Vec3::Z, [0.7, 1.0, 0.1]),
        (Vec3::NEG_Y, Vec3::Z, [1.0, 0.5, 0.0]),
        (Vec3::Z, Vec3::X, [0.5, 0.2, 1.0]),
        (Vec3::NEG_Z, Vec3::X, [0.0, 1.0, 0.5]),
    ];

    let mut vertices = Vec::with_capacity(faces.len() * 4);
    let mut indices = Vec::with_capacity(faces.len() * 6);

    for (normal, u, color) in faces {
        // u × v = normal, so the corners below wind counter-clockwise seen from outside.
        let v = normal.cross(u);
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (normal + u * su + v * sv) * 0.5;
            vertices.push(SceneVertex {
                position: p.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// Model transform for a given spin angle.
pub fn model_matrix(angle: f32) -> Mat4 {
    Mat4::from_rotation_y(angle) * Mat4::from_rotation_x(angle * 0.5)
}

fn spin(angle: Rc<Cell<f32>>, rate: f32) -> impl FnMut(f32) + 'static {
    move |dt| angle.set((angle.get() + rate * dt) % TAU)
}

pub struct NeonScene {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    config: SceneConfig,
    angle: Rc<Cell<f32>>,
}

impl NeonScene {
    /// Uploads the mesh and builds the scene pipeline for the offscreen target format.
    pub fn new(gpu: &Gpu<'_>, config: SceneConfig) -> Self {
        let device = gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("neon scene shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("neon scene bgl"),
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
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("neon scene layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("neon scene pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[SceneVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.offscreen_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (vertices, indices) = cube_mesh();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("neon scene vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("neon scene indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("neon scene uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("neon scene bind group"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::debug!("neon scene uploaded: {} vertices, {} indices", vertices.len(), indices.len());

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            uniform_buffer,
            bind_group,
            config,
            angle: Rc::new(Cell::new(0.0)),
        }
    }

    /// Animation driver spinning this scene's model. Shares the angle with the scene.
    pub fn spin_driver(&self) -> impl FnMut(f32) + 'static {
        spin(Rc::clone(&self.angle), self.config.spin_rate)
    }

    pub fn render(&self, gpu: &Gpu<'_>, frame: &mut GpuFrame, target: &OffscreenTarget, camera: &PerspectiveCamera) {
        let Some(depth) = target.depth_view() else {
            log::warn!("scene target has no depth attachment; skipping scene");
            return;
        };

        let light = self.config.light_direction.normalize_or_zero();
        let uniforms = SceneUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: model_matrix(self.angle.get()).to_cols_array_2d(),
            light: [light.x, light.y, light.z, self.config.ambient],
        };
        gpu.queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("neon scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.config.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── mesh ───────────────────────────────────────────────────────────────

    #[test]
    fn cube_has_four_vertices_and_two_triangles_per_face() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn triangles_face_outward() {
        let (vertices, indices) = cube_mesh();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(vertices[i as usize].position));
            let n = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn corners_lie_on_half_extent() {
        let (vertices, _) = cube_mesh();
        for v in &vertices {
            assert!(v.position.iter().all(|c| (c.abs() - 0.5).abs() < 1e-6));
        }
    }

    // ── uniforms and animation ─────────────────────────────────────────────

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
    }

    #[test]
    fn model_at_rest_is_identity() {
        assert!(model_matrix(0.0).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn scene_shader_validates() {
        use afterglow_engine::post::ShaderStage;
        use afterglow_engine::post::shader::validate;

        validate("scene", ShaderStage::Vertex, SCENE_SHADER).unwrap();
        validate("scene", ShaderStage::Fragment, SCENE_SHADER).unwrap();
    }

    #[test]
    fn spin_driver_advances_shared_angle() {
        let angle = Rc::new(Cell::new(0.0_f32));
        let mut driver = spin(Rc::clone(&angle), 2.0);

        driver(0.5);
        driver(0.25);
        assert!((angle.get() - 1.5).abs() < 1e-6);

        driver(3.0);
        assert!(angle.get() < TAU);
    }
}
