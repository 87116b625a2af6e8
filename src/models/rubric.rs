use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub guide: String,
    /// Analyst-editable question belonging to a custom or customised category.
    #[serde(default, rename = "isExtra")]
    pub is_extra: bool,
}

impl Question {
    pub fn fixed(id: &str, label: &str, guide: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            guide: guide.to_string(),
            is_extra: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Fixed,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionField {
    Label,
    Guide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub questions: Vec<Question>,
}

/// Effective category → question-set mapping for one folder scope.
/// Fixed categories come first in baseline order, custom ones follow in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub scope_id: String,
    pub categories: Vec<RubricCategory>,
}

impl Rubric {
    pub fn category(&self, name: &str) -> Option<&RubricCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn questions(&self, name: &str) -> &[Question] {
        self.category(name).map(|c| c.questions.as_slice()).unwrap_or(&[])
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn custom_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|c| c.kind == CategoryKind::Custom)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Baseline rubric: 5 fixed categories with 5 questions each.
pub fn default_question_sets() -> Vec<(String, Vec<Question>)> {
    vec![
        (
            "사업성".to_string(),
            vec![
                Question::fixed(
                    "biz_1",
                    "BM 고도화 수준",
                    "① BM 개발 중\n② BM 개발 완료 및 테스트 중\n③ 시장검증단계를 통해 가능성 확인\n④ BM을 통해 시장확보 및 고객 창출 중임\n⑤ BM을 통해 적정한 규모의 매출 발생 중임",
                ),
                Question::fixed(
                    "biz_2",
                    "수익성",
                    "① 영역이익의 실현이 어려워 보임\n② 1% 이상의 영역이익을 실현 가능\n③ 3% 이상의 영역이익을 실현 가능\n④ 5% 이상의 영역이익을 실현 가능\n⑤ 10% 이상의 영역이익을 실현 가능",
                ),
                Question::fixed(
                    "biz_3",
                    "매출 성장성",
                    "① 향후 3년 이내 1억 미만\n② 향후 3년 이내 1~5억\n③ 향후 3년 이내 5~10억\n④ 향후 3년 이내 10~50억\n⑤ 향후 3년 이내 50억 초과",
                ),
                Question::fixed(
                    "biz_4",
                    "판로 개척",
                    "① 새로운 시장이나 고객층에 대한 접근 전략이 없음\n② 새로운 시장이나 고객층에 대한 접근 전략 부족함\n③ 새로운 시장이나 고객층에 대한 접근 전략 보유\n④ 새로운 시장이나 고객층에 대한 접근 전략이 있고, 일부 수행 중\n⑤ 새로운 시장이나 고객층에 대한 접근 전략이 있고 성공적 수행 중",
                ),
                Question::fixed(
                    "biz_5",
                    "생산 능력",
                    "① 제품의 품질, 생산량, 생산 공정의 효율성 모두 부족함\n② 제품의 품질과 생산량이 부족하며, 생산 공정의 효율성이 크게 개선 필요함\n③ 제품의 품질이나 생산량이 부족하며, 생산 공정의 효율성이 개선 필요함\n④ 제품의 품질과 생산량이 충분하며, 생산 공정의 효율성이 일부 개선 필요함\n⑤ 제품의 품질과 생산량이 뛰어나며, 생산 공정이 효율적임",
                ),
            ],
        ),
        (
            "팀역량".to_string(),
            vec![
                Question::fixed(
                    "team_1",
                    "대표자 유관 경력",
                    "① 없음\n② 1~2년\n③ 3~4년\n④ 5~9년\n⑤ 10년 이상",
                ),
                Question::fixed(
                    "team_2",
                    "팀워크 역량",
                    "① 팀의 역할분담, 의사소통, 문화가 조화롭지 않음\n② 소수의 요소만 조화되어 있음\n③ 일부 요소만 조화되어 있음\n④ 대부분의 요소가 잘 조화되어 있음\n⑤ 팀의 역할 분담, 의사소통, 문화가 잘 조화되어 있음",
                ),
                Question::fixed(
                    "team_3",
                    "핵심 개발 인력",
                    "① 핵심 개발 인력의 역량이 부족함\n② 소수의 역량만 우수함\n③ 일부 역량이 우수함\n④ 대부분의 역량이 우수함\n⑤ 핵심 개발 인력의 모든 역량이 뛰어남",
                ),
                Question::fixed(
                    "team_4",
                    "핵심 경영진 역량",
                    "① 경영진의 역량이 부족함\n② 소수의 역량만 뛰어남\n③ 일부 역량이 뛰어남\n④ 대부분의 역량이 뛰어남\n⑤ 경영진의 모든 역량이 뛰어남",
                ),
                Question::fixed(
                    "team_5",
                    "회사 구성원의 전문성",
                    "① 팀원 대부분이 경험과 전문성이 부족함\n② 소수의 팀원만이 경험과 전문성을 가지고 있음\n③ 일부 팀원만이 경험과 전문성을 가지고 있음\n④ 대부분의 팀원이 경험과 전문성을 가지고 있음\n⑤ 팀원 대부분이 해당 분야에 대한 깊은 경험과 전문성을 가지고 있음",
                ),
            ],
        ),
        (
            "기술성".to_string(),
            vec![
                Question::fixed(
                    "tech_1",
                    "기술개발 완성도",
                    "① 아이디어 단계에 있는 기술\n② 연구개발 진행 단계에 있는 기술\n③ 연구개발 완료 단계에 있는 기술\n④ 상용화를 위한 시제품 제작단계에 있는 기술\n⑤ 상용화 및 양산기준을 충족시킬 수 있는 입증된 기술",
                ),
                Question::fixed(
                    "tech_2",
                    "유사 및 대체 기술 출현 가능성",
                    "① 적용 가능한 대체기술이 다수 존재함\n② 적용 가능한 대체기술이 일부(3개 이하) 존재함\n③ 일부 사항이 보완되면 적용 가능한 대체기술이 존재함\n④ 수명 기간 내에 대체기술의 출현 가능성이 있음\n⑤ 평가 대상 기술의 수명 기간 내에는 대체기술의 출현 가능성이 없음",
                ),
                Question::fixed(
                    "tech_3",
                    "기술의 경쟁력",
                    "① 경쟁기술 대비 기능 및 성능이 미흡함\n② 경쟁기술 대비 기능 및 성능이 다소 미흡하나 보완 가능\n③ 경쟁기술 대비 기능 및 성능이 유사하거나 다소 우위에 있음\n④ 경쟁기술 대비 기능 및 성능이 우수함\n⑤ 경쟁기술이 없으며, 기능 및 성능이 매우 뛰어남",
                ),
                Question::fixed(
                    "tech_4",
                    "모방 난이도",
                    "① 모방이 용이하며, 이로 인해 사업자체의 존립도 영향을 받음\n② 모방이 비교적 용이하며, 이로 인해 사업의 이익감소가 우려 됨\n③ 모방이 쉽지는 않으며, 모방을 통해 이익이 크게 침해받지는 않음\n④ 모방이 어렵고, 또한 모방여부를 쉽게 식별할 수 있음\n⑤ 고도의 기술축적이 필요하여 모방이 거의 불가능",
                ),
                Question::fixed(
                    "tech_5",
                    "기술의 확장성",
                    "① 확장 가능성이 없음\n② 일부 기술에 대한 보완이 이루어진다면, 확장이 가능함\n③ 단일 기술분야, 단일 제품군 내에서 복수의 제품으로 확장이 가능함\n④ 단일 기술분야에서 복수의 제품군으로 확장이 가능함\n⑤ 해당 산업 외에도 복수의 기술 분야로 확장이 가능함",
                ),
            ],
        ),
        (
            "시장성".to_string(),
            vec![
                Question::fixed(
                    "mkt_1",
                    "시장의 성장성",
                    "① 시장이 수요 감소의 따른 기업 철수기\n② 시장이 제품출시가 없는 R&D기\n③ 시장이 제품의 출시가 개시되는 도입기\n④ 시장이 형성되어 성장기로 접어드는 상태\n⑤ 시장이 수요 확대에 따른 매출 증가가 이루어지는 성숙기",
                ),
                Question::fixed(
                    "mkt_2",
                    "시장 경쟁도",
                    "① 업체간 경쟁상황이 치열함\n② 업체간 경쟁상황이 치열한 편이며, 경쟁제품이 시장을 과점하고 있음\n③ 경쟁제품이 다수 있으며, 선도업체가 없는 상황에서 시장을 분할하고 있음\n④ 경쟁제품이 소수 있으나, 선도업체가 없는 상황에서 시장을 분할하고 있음\n⑤ 경쟁제품이 거의 없어 사업영위에 미치는 영향이 없음",
                ),
                Question::fixed(
                    "mkt_3",
                    "국내 시장 규모",
                    "① 시장이 형성되지 않아 불확실함\n② 국내시장기준으로 연 50억원 이상의 시장이 형성되어 있음\n③ 국내시장기준으로 연 100억원 이상의 시장이 형성되어 있음\n④ 국내시장기준으로 연 500억원 이상의 시장이 형성되어 있음\n⑤ 국내 기준 연 1,000억 원 이상의 시장이 형성되어 있음",
                ),
                Question::fixed(
                    "mkt_4",
                    "글로벌 시장 규모",
                    "① 시장이 형성되지 않아 불확실\n② 연 100억원 이상의 글로벌 시장이 형성되어 있음\n③ 연 200억원 이상의 글로벌 시장이 형성되어 있음\n④ 연 1,000억원 이상의 글로벌 시장이 형성되어 있음\n⑤ 연 2,000억원 이상의 글로벌 시장이 형성되어 있음",
                ),
                Question::fixed(
                    "mkt_5",
                    "시장 진입장벽",
                    "① 진입장벽 요소 다수 존재\n② 초기투자부담, 차별화, 법∙제도적 제약 가운데 어느 한 요소 이상 존재\n③ 초기투자부담이 크지 않으며, 법∙제도적 제약이 약함\n④ 초기투자부담 크지 않으며, 법∙제도에 장려요인이 있음\n⑤ 초기투자부담이 낮으며, 법적 장려요인이 있음",
                ),
            ],
        ),
        (
            "지식재산권 포트폴리오".to_string(),
            vec![
                Question::fixed(
                    "fin_1",
                    "국내 특허 출원 및 등록",
                    "① 없음\n② 1개 이상\n③ 3개 이상\n④ 5개 이상\n⑤ 10개 이상",
                ),
                Question::fixed(
                    "fin_2",
                    "해외 특허 출원 및 등록",
                    "① 없음\n② 1개 이상\n③ 3개 이상\n④ 5개 이상\n⑤ 10개 이상",
                ),
                Question::fixed(
                    "fin_3",
                    "특허 포트폴리오 주관성/유관성",
                    "① 주관하지 않았고 유관성 없음\n② 특허 포트폴리오가 대표가 주관하였지만 사업유관성이 없음\n③ 특허 포트폴리오가 대표가 주관하지는 않았지만 사업유관성이 있음\n④ 특허 포트폴리오가  대표가 주관하였고 사업유관성도 있지만 향후 추가 계획은 없음\n⑤ 주관하였고 유관성 있으며 향후 계획 있음",
                ),
                Question::fixed(
                    "fin_4",
                    "IP 보호전략(특허 제외)",
                    "① 없음\n② 1건\n③ 2건\n④ 3~4건\n⑤ 5개 이상",
                ),
                Question::fixed(
                    "fin_5",
                    "기술사업화 전략",
                    "① 기술 특허를 기반으로 하여 사업을 구성해 본 경험이 없으며, 사업화에 대한 전략이 없음\n② 기술 특허를 기반으로 하여 사업을 구성해 본 경험이 없으며, 사업화에 대한 개략적인 전략을 보유하고 있음\n③ 기술 특허를 기반으로 하여 사업을 구성해 본 경험이 없으며, 사업화에 대한 구체적인 전략을 보유하고 있음\n④ 기술 특허를 기반으로 하여 사업을 진행한 경험이 있고, 사업화에 대한 개략적인 전략을 보유함\n⑤ 기술 특허를 기반으로 하여 사업을 진행한 경험이 있고, 사업화에 대한 구체적인 전략을 보유함",
                ),
            ],
        ),
    ]
}

/// Short question labels used on report cards when a record carries no custom label.
pub fn default_question_labels() -> BTreeMap<String, String> {
    [
        ("biz_1", "BM 고도화"),
        ("biz_2", "수익성"),
        ("biz_3", "매출 성장성"),
        ("biz_4", "판매처 확보"),
        ("biz_5", "생산 능력"),
        ("team_1", "대표자 경력"),
        ("team_2", "팀워크"),
        ("team_3", "핵심 개발인력"),
        ("team_4", "경영진 역량"),
        ("team_5", "전문성"),
        ("tech_1", "기술 완성도"),
        ("tech_2", "대체 가능성"),
        ("tech_3", "기술 경쟁력"),
        ("tech_4", "모방 난이도"),
        ("tech_5", "기술 확장성"),
        ("mkt_1", "시장 성장성"),
        ("mkt_2", "시장 경쟁도"),
        ("mkt_3", "국내 규모"),
        ("mkt_4", "글로벌 규모"),
        ("mkt_5", "진입 장벽"),
        ("fin_1", "국내 특허"),
        ("fin_2", "해외 특허"),
        ("fin_3", "사업 유관성"),
        ("fin_4", "IP 보호전략"),
        ("fin_5", "사업화 전략"),
    ]
    .into_iter()
    .map(|(id, label)| (id.to_string(), label.to_string()))
    .collect()
}
