//! 线性扫描的相似度排序

use rayon::prelude::*;

use crate::descriptor::{Descriptor, l2_norm};
use crate::record::{FrameRecord, SimilarityResult};

/// 余弦相似度，任一向量范数为 0 时返回 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0. || norm_b == 0. {
        return 0.;
    }
    let dot = a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum::<f64>();
    (dot / (norm_a as f64 * norm_b as f64)).clamp(-1., 1.) as f32
}

/// 计算查询描述符与每条记录的相似度，返回分数最高的 k 条
///
/// 分数相同时保持记录的原始顺序；`k` 为 0 时返回空列表
pub fn top_k(query: &Descriptor, records: &[FrameRecord], k: usize) -> Vec<SimilarityResult> {
    if k == 0 || records.is_empty() {
        return vec![];
    }

    let q = query.as_slice();
    let mut scored = records
        .par_iter()
        .map(|record| (cosine_similarity(q, record.descriptor.as_slice()), record))
        .collect::<Vec<_>>();

    // sort_by 是稳定排序
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(score, record)| SimilarityResult {
            id: record.id.clone(),
            score,
            image_path: record.image_path.clone(),
            descriptor: record.descriptor.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(values: &[f32]) -> Descriptor {
        Descriptor::from_values(values.to_vec()).unwrap()
    }

    fn record(name: &str, values: &[f32]) -> FrameRecord {
        FrameRecord::new(name, 0, descriptor(values))
    }

    #[test]
    fn cosine_bounds() {
        assert_eq!(cosine_similarity(&[0., 0.], &[1., 2.]), 0.);
        assert_eq!(cosine_similarity(&[1., 2.], &[0., 0.]), 0.);
        assert!((cosine_similarity(&[1., 2.], &[2., 4.]) - 1.).abs() < 1e-6);
        assert!((cosine_similarity(&[1., 0.], &[-1., 0.]) + 1.).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1., 0.], &[0., 1.]), 0.);
        let s = cosine_similarity(&[0.3, 0.1, 0.7], &[0.9, 0.2, 0.05]);
        assert!((-1. ..=1.).contains(&s));
    }

    #[test]
    fn ranks_descending() {
        let records = vec![
            record("a", &[0., 1.]),
            record("b", &[1., 0.]),
            record("c", &[1., 1.]),
        ];
        let result = top_k(&descriptor(&[1., 0.]), &records, 3);
        let ids = result.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["b_frame_0", "c_frame_0", "a_frame_0"]);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let records = (0..20).map(|i| record(&format!("v{i}"), &[1., 1.])).collect::<Vec<_>>();
        let query = descriptor(&[1., 1.]);
        let first = top_k(&query, &records, 20);
        let ids = first.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        let expected = records.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, expected);
        assert_eq!(top_k(&query, &records, 20), first);
    }

    #[test]
    fn k_saturation() {
        let records = vec![record("a", &[1.]), record("b", &[0.5, 0.5])];
        assert_eq!(top_k(&descriptor(&[1.]), &records, 10).len(), 2);
        assert_eq!(top_k(&descriptor(&[1.]), &records, 1).len(), 1);
        assert!(top_k(&descriptor(&[1.]), &records, 0).is_empty());
        assert!(top_k(&descriptor(&[1.]), &[], 5).is_empty());
    }

    #[test]
    fn zero_query_scores_zero() {
        let records = vec![record("a", &[1.]), record("b", &[0.2, 0.3])];
        let result = top_k(&Descriptor::zeros(), &records, 2);
        assert!(result.iter().all(|r| r.score == 0.));
        assert_eq!(result[0].id, "a_frame_0");
    }
}
