//! [`GpuDevice`] on `wgpu`, drawing into an offscreen RGBA8 target.

use std::collections::HashMap;

use crate::foundation::core::{Affine, BlendMode, DeviceBlend, WrapMode};
use crate::foundation::error::{TilingError, TilingResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::render::FrameRgba8;
use crate::render::accelerated::{GpuDevice, QUAD_INDICES, Quad, TilingUniforms};
use crate::render::shaders::shader_source;
use crate::texture::base::{BaseTexture, BaseTextureId};
use crate::texture::frame::Texture;
use crate::tiling::resolve::{PathKind, ShadingPath};

/// Offscreen target settings for [`WgpuDevice`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WgpuDeviceOpts {
    /// Target size in device pixels.
    pub width: u32,
    pub height: u32,
    /// Device pixels per logical pixel.
    pub resolution: f64,
    /// Straight-alpha clear color. Transparent when `None`.
    pub clear_rgba: Option<[u8; 4]>,
}

impl Default for WgpuDeviceOpts {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            resolution: 1.0,
            clear_rgba: None,
        }
    }
}

impl WgpuDeviceOpts {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_clear_rgba(mut self, rgba: [u8; 4]) -> Self {
        self.clear_rgba = Some(rgba);
        self
    }
}

/// Uniform block as laid out by the shaders' `Globals` struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalsUniform {
    projection: [[f32; 4]; 3],
    translation: [[f32; 4]; 3],
    uv_transform: [[f32; 4]; 3],
    map_coord: [[f32; 4]; 3],
    clamp_frame: [f32; 4],
    clamp_offset: [f32; 4],
    color: [f32; 4],
}

const GLOBALS_SIZE: u64 = std::mem::size_of::<GlobalsUniform>() as u64;
const VERTEX_STRIDE: u64 = 16;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

struct ResidentTexture {
    version: u64,
    wrap: WrapMode,
    premultiplied: bool,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// Draws into an offscreen `Rgba8Unorm` texture and reads it back as premultiplied RGBA8.
///
/// Base textures are uploaded on first bind and re-uploaded when their pixels, wrap mode or
/// alpha convention change.
pub struct WgpuDevice {
    opts: WgpuDeviceOpts,
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    readback_bytes_per_row: u32,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    shaders: HashMap<PathKind, wgpu::ShaderModule>,
    pipelines: HashMap<(PathKind, DeviceBlend), wgpu::RenderPipeline>,
    textures: HashMap<BaseTextureId, ResidentTexture>,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    globals: wgpu::Buffer,
    kind: PathKind,
    blend: DeviceBlend,
    bound: Option<BaseTextureId>,
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("opts", &self.opts)
            .field("resident_textures", &self.textures.len())
            .field("pipelines", &self.pipelines.len())
            .finish_non_exhaustive()
    }
}

impl WgpuDevice {
    /// Request an adapter and device and create the offscreen target, cleared.
    pub fn new(opts: WgpuDeviceOpts) -> TilingResult<Self> {
        if opts.width == 0 || opts.height == 0 {
            return Err(TilingError::validation("render target must be at least 1x1"));
        }
        if !(opts.resolution.is_finite() && opts.resolution > 0.0) {
            return Err(TilingError::validation("resolution must be > 0"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                TilingError::backend("no gpu adapter available")
            }
            other => TilingError::backend(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tessera_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| TilingError::backend(format!("wgpu request_device failed: {e:?}")))?;

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera_target"),
            size: wgpu::Extent3d {
                width: opts.width,
                height: opts.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row_unpadded = opts
            .width
            .checked_mul(4)
            .ok_or_else(|| TilingError::backend("render target width overflow"))?;
        let readback_bytes_per_row =
            align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback_size = u64::from(readback_bytes_per_row)
            .checked_mul(u64::from(opts.height))
            .ok_or_else(|| TilingError::backend("readback buffer size overflow"))?;
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera_readback"),
            size: readback_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera_tiling_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera_tiling_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera_quad_vertices"),
            size: VERTEX_STRIDE * 4,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let indices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera_quad_indices"),
            size: std::mem::size_of_val(&QUAD_INDICES) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&indices, 0, bytemuck::cast_slice(&QUAD_INDICES));
        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessera_globals"),
            size: GLOBALS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut out = Self {
            opts,
            device,
            queue,
            target,
            target_view,
            readback,
            readback_bytes_per_row,
            bind_group_layout,
            pipeline_layout,
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            textures: HashMap::new(),
            vertices,
            indices,
            globals,
            kind: PathKind::General,
            blend: DeviceBlend::new(BlendMode::Normal, true),
            bound: None,
        };
        out.clear();
        Ok(out)
    }

    pub fn opts(&self) -> &WgpuDeviceOpts {
        &self.opts
    }

    /// Reset the target to the clear color.
    pub fn clear(&mut self) {
        let clear = match self.opts.clear_rgba {
            Some(rgba) => {
                let mut px = rgba;
                premultiply_rgba8_in_place(&mut px);
                let [r, g, b, a] = px;
                wgpu::Color {
                    r: f64::from(r) / 255.0,
                    g: f64::from(g) / 255.0,
                    b: f64::from(b) / 255.0,
                    a: f64::from(a) / 255.0,
                }
            }
            None => wgpu::Color::TRANSPARENT,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessera_clear_encoder"),
            });
        {
            let _rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessera_clear_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
    }

    /// Copy the target back to the host. Pixels are premultiplied.
    pub fn readback_rgba8(&mut self) -> TilingResult<FrameRgba8> {
        let (width, height) = (self.opts.width, self.opts.height);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessera_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.readback_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| TilingError::backend(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| TilingError::backend("readback channel closed"))?
            .map_err(|e| TilingError::backend(format!("readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let row_bytes = width as usize * 4;
        let padded_row_bytes = self.readback_bytes_per_row as usize;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * padded_row_bytes;
            data.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        self.readback.unmap();

        Ok(FrameRgba8 {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Orthographic projection from logical pixels (y down) to clip space.
    fn projection(&self) -> Affine {
        let w = f64::from(self.opts.width) / self.opts.resolution;
        let h = f64::from(self.opts.height) / self.opts.resolution;
        Affine::new([2.0 / w, 0.0, 0.0, -2.0 / h, -1.0, 1.0])
    }

    fn upload(&mut self, base: &BaseTexture) -> TilingResult<()> {
        let pixels = base
            .pixels()
            .ok_or_else(|| TilingError::backend("cannot upload a base texture before it loads"))?;
        let premultiplied = base.premultiplied_alpha();
        let bytes = if premultiplied {
            pixels.rgba8_premul.as_ref().clone()
        } else {
            pixels.to_straight_rgba8()
        };
        let size = wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera_base_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(pixels.width * 4),
                rows_per_image: Some(pixels.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let wrap = base.wrap_mode();
        let address_mode = address_mode(wrap);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera_base_sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::debug!(
            base = base.id().0,
            width = pixels.width,
            height = pixels.height,
            ?wrap,
            "uploaded base texture"
        );
        self.textures.insert(
            base.id(),
            ResidentTexture {
                version: base.version(),
                wrap,
                premultiplied,
                _texture: texture,
                view,
                sampler,
            },
        );
        Ok(())
    }

    fn ensure_pipeline(&mut self, kind: PathKind, blend: DeviceBlend) {
        let device = &self.device;
        let shader: &wgpu::ShaderModule = self.shaders.entry(kind).or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tessera_tiling_shader"),
                source: wgpu::ShaderSource::Wgsl(shader_source(kind).into()),
            })
        });
        let layout = &self.pipeline_layout;
        self.pipelines.entry((kind, blend)).or_insert_with(|| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tessera_tiling_pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: VERTEX_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        blend: Some(blend_state(blend)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });
    }
}

impl GpuDevice for WgpuDevice {
    fn is_texture_resident(&self, base: &BaseTexture) -> bool {
        self.textures.contains_key(&base.id())
    }

    fn upload_quad(&mut self, quad: &Quad) {
        let mut vertices = [Vertex {
            position: [0.0; 2],
            uv: [0.0; 2],
        }; 4];
        for (i, v) in vertices.iter_mut().enumerate() {
            v.position = [quad.positions[i * 2], quad.positions[i * 2 + 1]];
            v.uv = [quad.uvs[i * 2], quad.uvs[i * 2 + 1]];
        }
        self.queue
            .write_buffer(&self.vertices, 0, bytemuck::cast_slice(&vertices));
    }

    fn bind_shader(&mut self, kind: PathKind) {
        self.kind = kind;
    }

    fn bind_texture(&mut self, texture: &Texture) -> TilingResult<u32> {
        let base = texture.base();
        let stale = match self.textures.get(&base.id()) {
            Some(t) => {
                t.version != base.version()
                    || t.wrap != base.wrap_mode()
                    || t.premultiplied != base.premultiplied_alpha()
            }
            None => true,
        };
        if stale {
            self.upload(base)?;
        }
        self.bound = Some(base.id());
        Ok(0)
    }

    fn set_uniforms(&mut self, uniforms: &TilingUniforms) {
        let (map_coord, clamp_frame, clamp_offset) = match uniforms.shading {
            ShadingPath::Simple => (Affine::IDENTITY, [0.0, 0.0, 1.0, 1.0], [0.0, 0.0]),
            ShadingPath::General {
                map_coord,
                clamp_frame,
                clamp_offset,
            } => (map_coord, clamp_frame, [clamp_offset.x, clamp_offset.y]),
        };
        let globals = GlobalsUniform {
            projection: affine_to_mat3(self.projection()),
            translation: affine_to_mat3(uniforms.translation),
            uv_transform: affine_to_mat3(uniforms.transform),
            map_coord: affine_to_mat3(map_coord),
            clamp_frame: clamp_frame.map(|v| v as f32),
            clamp_offset: [clamp_offset[0] as f32, clamp_offset[1] as f32, 0.0, 0.0],
            color: uniforms.color,
        };
        self.queue
            .write_buffer(&self.globals, 0, bytemuck::bytes_of(&globals));
    }

    fn set_blend_mode(&mut self, blend: DeviceBlend) {
        self.blend = blend;
    }

    fn draw_quad(&mut self) -> TilingResult<()> {
        let bound = self
            .bound
            .ok_or_else(|| TilingError::backend("draw_quad called without a bound texture"))?;
        let (kind, blend) = (self.kind, self.blend);
        self.ensure_pipeline(kind, blend);

        let resident = self
            .textures
            .get(&bound)
            .ok_or_else(|| TilingError::backend("bound texture is not resident"))?;
        let pipeline = self
            .pipelines
            .get(&(kind, blend))
            .ok_or_else(|| TilingError::backend("pipeline was not created"))?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera_tiling_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&resident.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&resident.sampler),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tessera_draw_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessera_draw_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rp.set_pipeline(pipeline);
            rp.set_bind_group(0, &bind_group, &[]);
            rp.set_vertex_buffer(0, self.vertices.slice(..));
            rp.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
            rp.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Color blend for a device blend. Straight-alpha sources are weighted by their alpha; the
/// destination stays premultiplied either way.
fn blend_state(blend: DeviceBlend) -> wgpu::BlendState {
    use wgpu::BlendFactor as F;

    let src = if blend.premultiplied {
        F::One
    } else {
        F::SrcAlpha
    };
    let (src_factor, dst_factor) = match blend.mode {
        BlendMode::Normal => (src, F::OneMinusSrcAlpha),
        BlendMode::Add => (src, F::One),
        BlendMode::Multiply => (F::Dst, F::OneMinusSrcAlpha),
        BlendMode::Screen => (F::One, F::OneMinusSrc),
    };
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor,
            dst_factor,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: F::One,
            dst_factor: F::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Column-major `mat3x3<f32>` with each column padded to a `vec4`.
fn affine_to_mat3(a: Affine) -> [[f32; 4]; 3] {
    let [a, b, c, d, e, f] = a.as_coeffs().map(|v| v as f32);
    [[a, b, 0.0, 0.0], [c, d, 0.0, 0.0], [e, f, 1.0, 0.0]]
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

#[cfg(test)]
#[path = "../../tests/unit/render/wgpu.rs"]
mod tests;
