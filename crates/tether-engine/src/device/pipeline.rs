use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::gfx::Primitive;
use crate::paint::Color;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SolidParams {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
    color: [f32; 4],
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// Solid-color pipelines, one per primitive topology, built on first use.
///
/// All pipelines share a single parameter buffer; callers write it and submit before
/// the next draw changes it.
pub(super) struct SolidPipelines {
    format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    by_topology: HashMap<Primitive, wgpu::RenderPipeline>,
}

impl SolidPipelines {
    pub(super) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tether solid shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/solid.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tether solid bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<SolidParams>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tether solid pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tether solid params"),
            size: std::mem::size_of::<SolidParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tether solid bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            }],
        });

        Self {
            format,
            shader,
            layout,
            params,
            bind_group,
            by_topology: HashMap::new(),
        }
    }

    pub(super) fn prepare(&mut self, device: &wgpu::Device, primitive: Primitive) {
        if self.by_topology.contains_key(&primitive) {
            return;
        }
        log::debug!("building solid pipeline for {primitive:?}");
        let pipeline = build(device, &self.shader, &self.layout, self.format, primitive);
        self.by_topology.insert(primitive, pipeline);
    }

    pub(super) fn write_params(&self, queue: &wgpu::Queue, viewport: (u32, u32), color: Color) {
        let params = SolidParams {
            viewport: [viewport.0 as f32, viewport.1 as f32],
            _pad: [0.0; 2],
            color: color.clamped().to_array(),
        };
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&params));
    }

    /// Pipeline and bind group for `primitive`; `None` until [`prepare`](Self::prepare) ran.
    pub(super) fn get(&self, primitive: Primitive) -> Option<(&wgpu::RenderPipeline, &wgpu::BindGroup)> {
        self.by_topology
            .get(&primitive)
            .map(|p| (p, &self.bind_group))
    }
}

fn topology(primitive: Primitive) -> wgpu::PrimitiveTopology {
    match primitive {
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Primitive::LineStrip => wgpu::PrimitiveTopology::LineStrip,
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn build(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    primitive: Primitive,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("tether solid pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRS,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: topology(primitive),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_layout_matches_the_shader() {
        // vec2 + vec2 padding + vec4
        assert_eq!(std::mem::size_of::<SolidParams>(), 32);
    }

    #[test]
    fn every_primitive_has_a_topology() {
        assert_eq!(topology(Primitive::Triangles), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(topology(Primitive::TriangleStrip), wgpu::PrimitiveTopology::TriangleStrip);
        assert_eq!(topology(Primitive::LineStrip), wgpu::PrimitiveTopology::LineStrip);
    }
}
