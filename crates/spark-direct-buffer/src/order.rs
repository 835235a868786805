//! 字节序标签与按字节序分区的固定映射。
//!
//! # 模块定位（Why）
//! - 分配器的全部状态按字节序划分为两份，彼此独立；字节序在这里只是数据（查找键与缓冲默认值），
//!   不承载行为。
//! - [`ByteOrderMap`] 以 `[T; 2]` 索引代替“大端一套字段、小端一套字段”的重复写法。

use core::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::{BufferError, Result};

/// 多字节数值的解释顺序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ByteOrder {
    /// 高位字节在前，亦即网络字节序。
    #[default]
    BigEndian,
    /// 低位字节在前。
    LittleEndian,
}

impl ByteOrder {
    /// 全部字节序，顺序与 [`ByteOrder::index`] 一致。
    pub const ALL: [ByteOrder; 2] = [ByteOrder::BigEndian, ByteOrder::LittleEndian];

    /// 当前编译目标的本机字节序。
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// 在 [`ByteOrderMap`] 中的槽位下标。
    pub const fn index(self) -> usize {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }

    /// 紧凑的数值标签，用于跨边界（FFI、线上元数据）传递字节序。
    pub const fn tag(self) -> u8 {
        self.index() as u8
    }

    /// 从数值标签还原字节序。
    ///
    /// # 契约（What）
    /// - `0` 为大端、`1` 为小端；
    /// - 其它取值只可能来自绕过枚举的调用方，返回 [`BufferError::DefectState`]，
    ///   调用方应当把它当作缺陷上报，而不是重试。
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(ByteOrder::BigEndian),
            1 => Ok(ByteOrder::LittleEndian),
            other => Err(BufferError::defect(format!(
                "byte order tag {other} is neither big-endian (0) nor little-endian (1)"
            ))),
        }
    }

    pub const fn is_big_endian(self) -> bool {
        matches!(self, ByteOrder::BigEndian)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "big-endian",
            ByteOrder::LittleEndian => "little-endian",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = BufferError;

    /// 解析配置或环境变量中的字节序名称，大小写不敏感。
    fn from_str(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "big" | "big-endian" | "big_endian" | "bigendian" | "be" | "network" => {
                Ok(ByteOrder::BigEndian)
            }
            "little" | "little-endian" | "little_endian" | "littleendian" | "le" => {
                Ok(ByteOrder::LittleEndian)
            }
            "" => Err(BufferError::invalid_argument("order", "byte order is unset")),
            _ => Err(BufferError::invalid_argument(
                "order",
                format!("unknown byte order `{raw}`"),
            )),
        }
    }
}

impl TryFrom<String> for ByteOrder {
    type Error = BufferError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

/// 以字节序为键的定长映射。
///
/// 两个槽位在运行时完全独立，借用其中一个不会影响另一个。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteOrderMap<T> {
    slots: [T; 2],
}

impl<T> ByteOrderMap<T> {
    /// 为每个字节序调用一次 `init` 构建映射。
    pub fn from_fn(mut init: impl FnMut(ByteOrder) -> T) -> Self {
        Self {
            slots: ByteOrder::ALL.map(&mut init),
        }
    }

    /// 与 [`from_fn`](Self::from_fn) 相同，但任一槽位构造失败即整体失败。
    pub fn try_from_fn<E>(
        mut init: impl FnMut(ByteOrder) -> core::result::Result<T, E>,
    ) -> core::result::Result<Self, E> {
        let big = init(ByteOrder::BigEndian)?;
        let little = init(ByteOrder::LittleEndian)?;
        Ok(Self {
            slots: [big, little],
        })
    }

    pub fn get(&self, order: ByteOrder) -> &T {
        &self.slots[order.index()]
    }

    pub fn get_mut(&mut self, order: ByteOrder) -> &mut T {
        &mut self.slots[order.index()]
    }

    /// 按 [`ByteOrder::ALL`] 的顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = (ByteOrder, &T)> {
        ByteOrder::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T> Index<ByteOrder> for ByteOrderMap<T> {
    type Output = T;

    fn index(&self, order: ByteOrder) -> &T {
        self.get(order)
    }
}

impl<T> IndexMut<ByteOrder> for ByteOrderMap<T> {
    fn index_mut(&mut self, order: ByteOrder) -> &mut T {
        self.get_mut(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_and_rejects_unknown() {
        for order in ByteOrder::ALL {
            assert_eq!(ByteOrder::from_tag(order.tag()), Ok(order));
        }
        let err = ByteOrder::from_tag(2).expect_err("未知标签必须失败");
        assert!(matches!(err, BufferError::DefectState { .. }));
    }

    #[test]
    fn parses_common_spellings() {
        assert_eq!("BE".parse::<ByteOrder>(), Ok(ByteOrder::BigEndian));
        assert_eq!("network".parse::<ByteOrder>(), Ok(ByteOrder::BigEndian));
        assert_eq!(" Little-Endian ".parse::<ByteOrder>(), Ok(ByteOrder::LittleEndian));

        let unset = "".parse::<ByteOrder>().expect_err("空字符串视为未设置");
        assert!(matches!(
            unset,
            BufferError::InvalidArgument { argument: "order", .. }
        ));
        let unknown = "middle".parse::<ByteOrder>().expect_err("未知名称必须失败");
        assert!(unknown.to_string().contains("middle"));
    }

    #[test]
    fn map_slots_are_independent() {
        let mut map = ByteOrderMap::from_fn(|order| order.index() * 10);
        map[ByteOrder::LittleEndian] += 1;
        assert_eq!(map[ByteOrder::BigEndian], 0);
        assert_eq!(map[ByteOrder::LittleEndian], 11);
        let collected: Vec<_> = map.iter().map(|(order, value)| (order, *value)).collect();
        assert_eq!(
            collected,
            vec![(ByteOrder::BigEndian, 0), (ByteOrder::LittleEndian, 11)]
        );
    }

    #[test]
    fn try_from_fn_stops_at_first_failure() {
        let mut visited = Vec::new();
        let result: core::result::Result<ByteOrderMap<u8>, &str> = ByteOrderMap::try_from_fn(|order| {
            visited.push(order);
            Err("boom")
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(visited, vec![ByteOrder::BigEndian]);
    }

    #[test]
    fn native_matches_target() {
        assert_eq!(
            ByteOrder::native().is_big_endian(),
            cfg!(target_endian = "big")
        );
    }
}
