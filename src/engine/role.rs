// ==========================================
// 衣橱周计划系统 - 穿搭角色识别
// ==========================================
// 职责: 按有序关键字规则表识别衣物角色; 校验穿搭角色槽位
// 红线: 规则按表顺序匹配, 首个命中生效; 未命中一律归为 top
// 红线: 无法识别的衣物不得阻断穿搭构建
// ==========================================

use crate::domain::types::Role;
use crate::domain::wardrobe::ClothingItem;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashSet;

/// 角色识别规则表（按顺序匹配 "类别 名称" 小写文本）
pub const ROLE_RULES: &[(Role, &[&str])] = &[
    (
        Role::Outerwear,
        &["jacket", "coat", "blazer", "cardigan", "parka", "outerwear", "windbreaker"],
    ),
    (
        Role::Shoes,
        &["shoe", "sneaker", "boot", "sandal", "heel", "loafer", "footwear", "trainer"],
    ),
    (
        Role::Bottom,
        &["pants", "jeans", "skirt", "shorts", "trousers", "leggings", "chino", "bottom"],
    ),
    (Role::Dress, &["dress", "gown", "robe", "jumpsuit"]),
    (
        Role::Accessory,
        &[
            "accessor", "bag", "purse", "backpack", "hat", "cap", "beanie", "scarf", "shawl",
            "belt", "watch", "jewel", "necklace", "bracelet", "sunglasses", "gloves",
        ],
    ),
    (
        Role::Top,
        &["shirt", "blouse", "top", "sweater", "hoodie", "polo", "tank", "tee"],
    ),
];

/// 识别衣物角色
///
/// # 规则
/// - 文本 = 类别 + " " + 名称（小写）
/// - 按 ROLE_RULES 顺序, 首个关键字命中的角色生效
/// - 未命中 → Role::Top
pub fn classify_role(category: &str, name: &str) -> Role {
    let text = format!("{} {}", category, name).to_lowercase();
    ROLE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(role, _)| *role)
        .unwrap_or(Role::Top)
}

/// 识别衣物角色（实体版本）
pub fn classify_item(item: &ClothingItem) -> Role {
    classify_role(&item.category, &item.name)
}

/// 校验穿搭角色槽位
///
/// # 规则
/// - 至少一件衣物
/// - 同一角色最多一件
/// - 必须包含 dress, 或同时包含 top 与 bottom
pub fn validate_outfit_roles(items: &[ClothingItem]) -> EngineResult<Vec<Role>> {
    if items.is_empty() {
        return Err(EngineError::InvalidInput("穿搭至少包含一件衣物".to_string()));
    }

    let roles: Vec<Role> = items.iter().map(classify_item).collect();
    let mut seen = HashSet::new();
    for (item, role) in items.iter().zip(&roles) {
        if !seen.insert(*role) {
            return Err(EngineError::InvalidInput(format!(
                "角色重复: {} ({})",
                role, item.name
            )));
        }
    }

    let complete = seen.contains(&Role::Dress)
        || (seen.contains(&Role::Top) && seen.contains(&Role::Bottom));
    if !complete {
        return Err(EngineError::InvalidInput(
            "穿搭需要 dress 或 top + bottom".to_string(),
        ));
    }
    Ok(roles)
}
