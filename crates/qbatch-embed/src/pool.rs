use qbatch_core::error::{Error, Result};

/// Sum `vectors` element-wise and L2-normalise the result.
///
/// Fails when there is nothing to pool or the pooled vector has zero length,
/// since a zero vector has no direction to compare against.
pub fn sum_l2<'a, I>(vectors: I, dim: usize) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum = vec![0f32; dim];
    let mut pooled = 0usize;
    for v in vectors {
        if v.len() != dim {
            return Err(Error::Embedding(format!("vector of dimension {} where {} was expected", v.len(), dim)));
        }
        for (acc, x) in sum.iter_mut().zip(v) { *acc += x; }
        pooled += 1;
    }
    if pooled == 0 {
        return Err(Error::Embedding("no vectors to pool".into()));
    }
    l2_normalize(&mut sum)?;
    Ok(sum)
}

pub fn l2_normalize(v: &mut [f32]) -> Result<()> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(Error::Embedding("cannot normalise a zero-length vector".into()));
    }
    for x in v.iter_mut() { *x /= norm; }
    Ok(())
}
