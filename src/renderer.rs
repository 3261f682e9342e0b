use anyhow::{Context, Result};
use glam::Vec2;
use scenery::Canvas;
use scenery::shading::Color;
use std::sync::Arc;
use winit::window::Window;

const ELLIPSE_SEGMENTS: usize = 16;
const INITIAL_VERTEX_CAPACITY: u64 = 64 * 1024;
const SKY: wgpu::Color = wgpu::Color { r: 0.53, g: 0.81, b: 0.92, a: 1.0 };

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    position: [f32; 2],
    color: [f32; 4],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Triangle list for one frame, in normalized device coordinates.
pub struct FrameBatch {
    size: Vec2,
    vertices: Vec<Vertex>,
}

impl FrameBatch {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            vertices: Vec::new(),
        }
    }

    fn vertex(&self, point: Vec2, color: [f32; 4]) -> Vertex {
        let ndc = Vec2::new(point.x / self.size.x * 2.0 - 1.0, 1.0 - point.y / self.size.y * 2.0);
        Vertex { position: ndc.to_array(), color }
    }

    fn fan(&mut self, points: &[Vec2], color: [f32; 4]) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            for &p in &[first, pair[0], pair[1]] {
                let v = self.vertex(p, color);
                self.vertices.push(v);
            }
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: [f32; 4]) {
        let along = to - from;
        if along.length_squared() == 0.0 {
            return;
        }
        let normal = along.perp().normalize() * 0.5;
        self.fan(&[from + normal, to + normal, to - normal, from - normal], color);
    }
}

fn rgba(color: Color, alpha: f32) -> [f32; 4] {
    let [r, g, b] = color.to_linear();
    [r, g, b, alpha]
}

impl Canvas for FrameBatch {
    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        self.fan(points, rgba(color, 1.0));
    }

    fn stroke_polygon(&mut self, points: &[Vec2], color: Color, alpha: f32) {
        let color = rgba(color, alpha);
        for (i, &from) in points.iter().enumerate() {
            let to = points[(i + 1) % points.len()];
            self.line(from, to, color);
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        let outline: Vec<Vec2> = (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let angle = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                center + Vec2::new(angle.cos(), angle.sin()) * radii
            })
            .collect();
        self.fan(&outline, rgba(color, 1.0));
    }

    fn place_billboard(&mut self, anchor: Vec2, size: Vec2, tint: Color) {
        let half = size.x * 0.5;
        let quad = [
            Vec2::new(anchor.x - half, anchor.y - size.y),
            Vec2::new(anchor.x + half, anchor.y - size.y),
            Vec2::new(anchor.x + half, anchor.y),
            Vec2::new(anchor.x - half, anchor.y),
        ];
        self.fan(&quad, rgba(tint, 1.0));
    }
}

pub struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    num_vertices: u32,
}

impl State {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor { ..Default::default() });
        let surface = instance.create_surface(window).context("creating surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .context("requesting adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                ..Default::default()
            })
            .await
            .context("requesting device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Polygons arrive in either winding; painter's order replaces depth testing.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_capacity = INITIAL_VERTEX_CAPACITY;
        let vertex_buffer = create_vertex_buffer(&device, vertex_capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            vertex_buffer,
            vertex_capacity,
            num_vertices: 0,
        })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Replaces the GPU copy of the frame. Skipping this keeps redrawing the
    /// previous frame.
    pub fn upload(&mut self, batch: &FrameBatch) {
        let needed = batch.vertices.len() as u64;
        if needed > self.vertex_capacity {
            self.vertex_capacity = needed.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
            log::debug!("vertex buffer grown to {} vertices", self.vertex_capacity);
        }
        if needed > 0 {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&batch.vertices));
        }
        self.num_vertices = batch.vertices.len() as u32;
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if self.num_vertices > 0 {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..self.num_vertices, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Vertex Buffer"),
        size: capacity * std::mem::size_of::<Vertex>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
