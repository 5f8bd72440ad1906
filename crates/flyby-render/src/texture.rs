//! Color textures for the mesh pipeline.
//!
//! [`TextureBinder`] owns the shared bind group layout and sampler and turns
//! decoded RGBA8 pixels into a ready-to-bind [`GpuTexture`].

/// Errors that can occur during texture creation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Pixel data length doesn't match `width * height * 4`.
    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// A side exceeds the device's `max_texture_dimension_2d`.
    #[error("texture {width}x{height} exceeds the device limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// A sampled 2D texture with its bind group.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub dimensions: (u32, u32),
}

/// Shared layout and sampler for color maps (group 2 of the mesh pipeline).
pub struct TextureBinder {
    pub layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

/// Texel format of every color map: sRGB-encoded RGBA8.
pub const COLOR_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

impl TextureBinder {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("color-map-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("color-map-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Self { layout, sampler }
    }

    /// Upload tightly packed RGBA8 pixels.
    pub fn create(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<GpuTexture, TextureError> {
        let max = device.limits().max_texture_dimension_2d;
        validate_rgba(rgba, width, height, max)?;
        Ok(self.upload(device, queue, label, rgba, width, height))
    }

    /// 1×1 white texture bound by untextured materials.
    pub fn white(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTexture {
        self.upload(device, queue, "white", &[255; 4], 1, 1)
    }

    fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> GpuTexture {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_MAP_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: None,
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!("Created texture '{label}' ({width}x{height})");
        GpuTexture {
            texture,
            view,
            bind_group,
            dimensions: (width, height),
        }
    }
}

fn validate_rgba(rgba: &[u8], width: u32, height: u32, max: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    if width > max || height > max {
        return Err(TextureError::TooLarge { width, height, max });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: rgba.len(),
            expected,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            validate_rgba(&[], 0, 4, 8192),
            Err(TextureError::ZeroDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let err = validate_rgba(&[0; 15], 2, 2, 8192).unwrap_err();
        assert!(matches!(
            err,
            TextureError::DataSizeMismatch {
                actual: 15,
                expected: 16,
                ..
            }
        ));
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_exact_size_accepted() {
        assert!(validate_rgba(&[0; 16], 2, 2, 8192).is_ok());
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let err = validate_rgba(&[], 8193, 4, 8192).unwrap_err();
        assert!(matches!(
            err,
            TextureError::TooLarge {
                width: 8193,
                height: 4,
                max: 8192
            }
        ));
        assert!(validate_rgba(&[0; 8192 * 4], 8192, 1, 8192).is_ok());
    }

    #[test]
    fn test_create_rejects_texture_beyond_device_limit() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let binder = TextureBinder::new(&device);
        let width = device.limits().max_texture_dimension_2d + 1;
        let result = binder.create(&device, &queue, "huge", &[], width, 1);
        assert!(matches!(result, Err(TextureError::TooLarge { .. })));
    }

    #[test]
    fn test_white_texture_is_one_texel() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let binder = TextureBinder::new(&device);
        let white = binder.white(&device, &queue);
        assert_eq!(white.dimensions, (1, 1));
        assert_eq!(white.texture.format(), COLOR_MAP_FORMAT);
    }
}
