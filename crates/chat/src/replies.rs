use printquote_core::domain::answers::{back_name_label, ChatAnswers};
use printquote_core::domain::catalog::format_yen;
use printquote_core::domain::quote::QuoteRecord;
use printquote_core::flows::{ConversationStep, Prompt};
use serde::Serialize;

use crate::routing::STAFF_HANDOFF_KEYWORD;

pub const FAQ_URL: &str = "https://graffitees.jp/faq/";
pub const WEB_ORDER_PATH: &str = "/web-orders";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Prompt,
    Completed,
    Aborted,
    QuoteFailed,
    Inquiry,
    StaffHandoff,
    Catalog,
}

/// One choice offered with a reply. `value` is the text sent back when the
/// option is picked; `url` options open a page instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyOption {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ReplyOption {
    pub fn answer(label: impl Into<String>) -> Self {
        let label = label.into();
        Self { value: Some(label.clone()), label, url: None }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self { label: label.into(), value: None, url: Some(url.into()) }
    }
}

/// Outbound reply. Carries the conversation step and its legal answers, never
/// channel-specific markup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub kind: ReplyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<ConversationStep>,
    pub text: String,
    pub options: Vec<ReplyOption>,
}

impl Reply {
    fn text_only(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self { kind, step: None, text: text.into(), options: Vec::new() }
    }

    /// `single_position` picks the wording of the color-count question.
    pub fn prompt(prompt: &Prompt, single_position: Option<bool>) -> Self {
        Self {
            kind: ReplyKind::Prompt,
            step: Some(prompt.step),
            text: question(prompt.step, single_position),
            options: prompt.options.iter().map(ReplyOption::answer).collect(),
        }
    }

    pub fn completed(answers: &ChatAnswers, record: &QuoteRecord) -> Self {
        let back_name = if answers.placement.is_single_position() {
            "なし"
        } else {
            back_name_label(answers.back_name)
        };
        let mut text = format!(
            "概算のお見積りが完了しました。\n\n\
             見積番号: {quote_id}\n\
             属性: {user_type}\n\
             使用日: {usage_date}（{discount}）\n\
             予算: {budget}\n\
             商品: {item}\n\
             枚数: {quantity}\n\
             プリント位置: {placement}\n\
             色数: {colors}\n\
             背ネーム・番号: {back_name}\n\n\
             【合計金額】¥{total}\n\
             【1枚あたり】¥{unit}",
            quote_id = record.quote_id,
            user_type = answers.user_type.label(),
            usage_date = answers.usage_date.label(),
            discount = answers.usage_date.discount_class().display_label(),
            budget = answers.budget.label(),
            item = answers.item,
            quantity = answers.quantity_label,
            placement = answers.placement.label(),
            colors = answers.color_selection,
            total = format_yen(record.total_price),
            unit = format_yen(record.unit_price),
        );
        if record.within_budget == Some(false) {
            text.push_str("\n\n※1枚あたりの金額がご希望の予算を上回っています。");
        }

        Self {
            kind: ReplyKind::Completed,
            step: Some(ConversationStep::Complete),
            text,
            options: Vec::new(),
        }
    }

    pub fn aborted() -> Self {
        Self::text_only(
            ReplyKind::Aborted,
            "入力内容に誤りがあるようです。 \n\
             お手数をおかけしますが、再度メニューの「カンタン見積り」より、\
             該当の項目を選択タブからお選びください。\n\
             ※テキストの直接入力はご利用いただけませんので、ご了承くださいませ。",
        )
    }

    pub fn quote_failed() -> Self {
        Self::text_only(
            ReplyKind::QuoteFailed,
            "申し訳ございません。選択された内容ではお見積りを算出できませんでした。\n\
             お手数ですが「お問い合わせ」よりご相談くださいませ。",
        )
    }

    pub fn inquiry() -> Self {
        Self {
            kind: ReplyKind::Inquiry,
            step: None,
            text: "お問い合わせ情報".to_owned(),
            options: vec![
                ReplyOption::link("よくあるご質問", FAQ_URL),
                ReplyOption {
                    label: "有人チャット".to_owned(),
                    value: Some(STAFF_HANDOFF_KEYWORD.to_owned()),
                    url: None,
                },
                ReplyOption::link("Webフォーム注文", WEB_ORDER_PATH),
            ],
        }
    }

    pub fn staff_handoff() -> Self {
        Self::text_only(
            ReplyKind::StaffHandoff,
            "有人チャットに接続いたします。\n\
             ご検討中のデザインを画像やイラストでお送りください。\n\n\
             ※当ショップの営業時間は10：00～18：00となります。\n\
             営業時間外のお問い合わせにつきましては確認ができ次第の回答となります。\n\
             誠に恐れ入りますが、ご了承くださいませ。\n\n\
             その他ご要望などがございましたらメッセージでお送りくださいませ。\n\
             よろしくお願い致します。",
        )
    }

    pub fn catalog() -> Self {
        Self::text_only(
            ReplyKind::Catalog,
            "カタログ無料プレゼント\n\n\
             クラスTシャツの最新デザインやトレンド情報が詰まったカタログを、\
             期間限定で無料でお届けします。\n\n\
             【応募方法】\n\
             以下のアカウントをフォロー（どちらかでOK）\n\
             Instagram\nhttps://www.instagram.com/graffitees_045/\n\
             TikTok\nhttps://www.tiktok.com/@graffitees_045\n\n\
             フォロー後、下記のフォームからお申込みください。\n\
             カタログ申込みフォーム\nhttps://graffitees-line-bot.onrender.com/catalog_form\n\
             ※サブアカウントや重複申込みはご遠慮ください。\n\n\
             【配布数について】\n\
             先着300名様分を予定しています。\n\
             ※応募多数となった場合、配布数の増加や抽選となる可能性があります。",
        )
    }
}

fn question(step: ConversationStep, single_position: Option<bool>) -> String {
    match step {
        ConversationStep::AwaitUserType => "ご利用者の属性を選択してください。".to_owned(),
        ConversationStep::AwaitUsageDate => {
            "ご使用日は、今日より? \n(注文日より使用日が14日目以降なら早割)".to_owned()
        }
        ConversationStep::AwaitBudget => "ご希望の1枚あたり予算を選択してください。".to_owned(),
        ConversationStep::AwaitItem => "ご希望の商品を選択してください。".to_owned(),
        ConversationStep::AwaitQuantity => "必要枚数を選択してください。".to_owned(),
        ConversationStep::AwaitPrintPosition => {
            "プリントを入れる箇所を選択してください。".to_owned()
        }
        ConversationStep::AwaitColorCount => {
            let scope = match single_position {
                Some(false) => "（前と背中）",
                _ => "（前のみ/背中のみ）",
            };
            format!("プリントの色数を選択してください。\n{scope}")
        }
        ConversationStep::AwaitBackName => "背ネームや番号を入れる場合は選択してください。\n\
             不要な場合は「背ネーム・番号を使わない」を選択してください。"
            .to_owned(),
        ConversationStep::Complete => "概算のお見積りが完了しました。".to_owned(),
    }
}
