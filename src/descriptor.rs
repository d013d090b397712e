//! 颜色分布描述符
//!
//! 每一帧先被拉伸到 128x128，再统计 (B, G, R) 三通道的联合直方图，
//! 分箱数为 8x8x4，展开顺序为 `(b * 8 + g) * 4 + r`，R 变化最快。
//! 最后做 L2 归一化，得到长度固定为 256 的向量。

use byteorder::{ByteOrder, LittleEndian};
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::{RasterFrame, decode_image};

/// 描述符维数
pub const DESCRIPTOR_LEN: usize = 256;
/// 描述符序列化后的字节数
pub const DESCRIPTOR_BYTES: usize = DESCRIPTOR_LEN * 4;
/// 提取前统一缩放到的边长
pub const CANVAS_SIZE: u32 = 128;
/// 各通道分箱数，顺序为 B, G, R
pub const BINS: [usize; 3] = [8, 8, 4];

/// 长度固定为 256 的非负有限向量，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Descriptor(Vec<f32>);

impl Descriptor {
    /// 全零描述符，对应空直方图
    pub fn zeros() -> Self {
        Self(vec![0.; DESCRIPTOR_LEN])
    }

    /// 从数值构造描述符
    ///
    /// 长度不足时在右侧补零，超出长度视为内部错误
    pub fn from_values(mut values: Vec<f32>) -> Result<Self> {
        if values.len() > DESCRIPTOR_LEN {
            return Err(Error::DescriptorOverflow(values.len()));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.) {
            return Err(Error::InvalidParameter(format!("描述符包含非法数值 {v}")));
        }
        values.resize(DESCRIPTOR_LEN, 0.);
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 所有分量均为 0
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.)
    }

    /// L2 范数
    pub fn norm(&self) -> f32 {
        l2_norm(&self.0)
    }

    /// 序列化为小端序 f32 字节
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0; DESCRIPTOR_BYTES];
        LittleEndian::write_f32_into(&self.0, &mut buf);
        buf
    }

    /// 从小端序 f32 字节反序列化，校验长度和数值
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DESCRIPTOR_BYTES {
            return Err(Error::InvalidParameter(format!(
                "描述符字节长度为 {}，应为 {DESCRIPTOR_BYTES}",
                bytes.len()
            )));
        }
        let mut values = vec![0.; DESCRIPTOR_LEN];
        LittleEndian::read_f32_into(bytes, &mut values);
        Self::from_values(values)
    }
}

impl TryFrom<Vec<f32>> for Descriptor {
    type Error = Error;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::from_values(values)
    }
}

impl From<Descriptor> for Vec<f32> {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.0
    }
}

pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt() as f32
}

/// 计算一帧的描述符
pub fn extract(frame: &RasterFrame) -> Result<Descriptor> {
    let canvas = imageops::resize(frame.as_image(), CANVAS_SIZE, CANVAS_SIZE, FilterType::Triangle);

    let mut hist = [0u32; DESCRIPTOR_LEN];
    for pixel in canvas.pixels() {
        let [r, g, b] = pixel.0;
        hist[cell_index(b, g, r)] += 1;
    }

    Descriptor::from_values(normalize(&hist))
}

/// 解码图片字节并计算描述符
pub fn extract_bytes(bytes: &[u8]) -> Result<Descriptor> {
    extract(&decode_image(bytes)?)
}

/// 联合直方图中的单元格下标
#[inline]
fn cell_index(c0: u8, c1: u8, c2: u8) -> usize {
    let [n0, n1, n2] = BINS;
    (bin(c0, n0) * n1 + bin(c1, n1)) * n2 + bin(c2, n2)
}

#[inline]
fn bin(value: u8, bins: usize) -> usize {
    value as usize * bins / 256
}

/// L2 归一化，全零直方图保持全零
fn normalize(hist: &[u32]) -> Vec<f32> {
    let norm = hist.iter().map(|&c| c as f64 * c as f64).sum::<f64>().sqrt();
    if norm == 0. {
        return vec![0.; hist.len()];
    }
    hist.iter().map(|&c| (c as f64 / norm) as f32).collect()
}
