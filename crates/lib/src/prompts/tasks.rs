//! # Default Task Prompts
//!
//! The default, hardcoded prompt templates for the planner tasks.
//! These are loaded programmatically and can be overridden by `config.yml` or `prompt.yml`.

// --- Spot Recommendation ---
pub const SPOT_RECOMMENDATION_SYSTEM_PROMPT: &str = r#"あなたはドライブスポットのレコメンドAIです。"#;

pub const SPOT_RECOMMENDATION_USER_PROMPT: &str = r#"以下の情報をもとに、ユーザーに最適なドライブスポットを3〜5件選んでください。

{preference_context}{history_context}
候補スポット:
{candidate_list}

選択基準:
1. ユーザーの好みに合ったカテゴリを優先
2. 最近おすすめ済みのスポットは避ける
3. バラエティを持たせる（同じカテゴリばかりにしない）
4. 距離と所要時間のバランス

以下のJSON形式で回答してください:
{"spot_ids": [選択したスポットのID配列], "message": "おすすめ理由を簡潔に説明"}
"#;

// --- Route Planning ---
pub const ROUTE_PLANNING_SYSTEM_PROMPT: &str = r#"あなたはドライブルートのプランナーAIです。"#;

pub const ROUTE_PLANNING_USER_PROMPT: &str = r#"現在地から出発して、いくつかのスポットを経由して現在地に戻る周遊ドライブルートを作成してください。

【基本情報】
現在地: 緯度{lat}, 経度{lng}
出発時刻: {departure_time}
使える時間: 約{available_hours}時間
ランダムシード: {random_seed}（毎回異なるルートを提案するため）
{avoid_hint}
【候補スポット】
{candidate_list}
【要件】
1. メインの目的地（ドライブスポット）を1〜3箇所選ぶ
2. 食事スポットがあれば、昼食時間帯（11:30-13:30頃）に1箇所組み込む
3. 休憩スポットがあれば適宜組み込む（長距離の場合）
4. 効率的で無駄のないルート順序にする
5. 出発地と帰着地は同じ（現在地）
6. 各スポットの滞在時間目安: ドライブスポット30-60分、食事45-60分、休憩15-30分
7. **前回と違うルートを提案してください**

【出力形式】JSON形式で回答:
{
  "route_ids": [スポットIDを訪問順に配列。出発地・帰着地は含めない],
  "stay_durations": [各スポットの滞在時間（分）を対応する順番で配列],
  "message": "このルートの特徴や楽しみ方を2文程度で"
}
"#;

/// Default token budget for the recommendation task.
pub const SPOT_RECOMMENDATION_MAX_TOKENS: u32 = 500;

/// Default token budget for the route planning task.
pub const ROUTE_PLANNING_MAX_TOKENS: u32 = 600;
