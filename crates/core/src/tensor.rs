use serde::{Deserialize, Serialize};

/// Channel count of the latent storage format.
pub const LATENT_CHANNELS: usize = 4;
/// Pixel-to-latent scale factor of the storage format.
pub const LATENT_DOWNSCALE: u32 = 8;

/// Image descriptor in `[batch, height, width, channels]` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTensor {
    pub shape: [usize; 4],
}

impl ImageTensor {
    pub fn new(batch: usize, height: usize, width: usize, channels: usize) -> Self {
        Self {
            shape: [batch, height, width, channels],
        }
    }

    pub fn batch(&self) -> usize {
        self.shape[0]
    }

    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn width(&self) -> usize {
        self.shape[2]
    }

    pub fn channels(&self) -> usize {
        self.shape[3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; len],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Empty latent batch. The buffer lives under `samples`, matching the
/// dictionary the host passes between sampler nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Latent {
    pub samples: Tensor,
}

impl Latent {
    /// Allocates zeros for `batch` images of `height`x`width` pixels.
    pub fn empty(batch: usize, height: u32, width: u32) -> Self {
        let latent_height = (height / LATENT_DOWNSCALE) as usize;
        let latent_width = (width / LATENT_DOWNSCALE) as usize;
        Self {
            samples: Tensor::zeros(&[batch, LATENT_CHANNELS, latent_height, latent_width]),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.samples.shape().first().copied().unwrap_or(0)
    }
}
