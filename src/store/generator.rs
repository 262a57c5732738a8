use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::generate_random_code;

/// 随机短码来源
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, alphabet: &[u8], length: usize) -> String;
}

/// 均匀随机抽取
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, alphabet: &[u8], length: usize) -> String {
        generate_random_code(alphabet, length)
    }
}

/// 循环返回预设的短码，忽略字符表和长度。用于在测试中制造碰撞。
#[derive(Debug)]
pub struct SequenceCodeGenerator {
    codes: Vec<String>,
    next: AtomicUsize,
}

impl SequenceCodeGenerator {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// 已经生成过的次数
    pub fn calls(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

impl CodeGenerator for SequenceCodeGenerator {
    fn generate(&self, _alphabet: &[u8], _length: usize) -> String {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        if self.codes.is_empty() {
            // 空串不是合法短码，会被调用方当作一次失败的尝试
            return String::new();
        }
        self.codes[i % self.codes.len()].clone()
    }
}
