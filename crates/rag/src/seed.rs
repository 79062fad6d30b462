//! Built-in knowledge passages. Short, source-labeled snippets covering the
//! guidance the specialists cite; the index treats them like any other
//! corpus content.

use crate::corpus::{CorpusId, Passage};

fn passage(corpus: CorpusId, id: &str, text: &str) -> Passage {
    Passage {
        id: id.to_string(),
        corpus,
        source: corpus.source_label().to_string(),
        text: text.to_string(),
    }
}

pub fn builtin_passages() -> Vec<Passage> {
    vec![
        passage(
            CorpusId::AdaGuidelines,
            "ada-glucose-targets",
            "For most non-pregnant adults with diabetes the recommended blood \
             glucose target range is 80 to 130 mg/dL before meals, and below \
             180 mg/dL one to two hours after the start of a meal. Targets \
             should be individualized with a clinician based on age, duration \
             of diabetes, and hypoglycemia risk.",
        ),
        passage(
            CorpusId::AdaGuidelines,
            "ada-hypoglycemia-protocol",
            "Hypoglycemia is blood glucose below 70 mg/dL. Treat it with the \
             15-15 rule: take 15 grams of fast-acting carbohydrate such as \
             glucose tablets, juice, or regular soda, then recheck after 15 \
             minutes and repeat until glucose is back above 70 mg/dL. Follow \
             with a snack containing protein if the next meal is more than an \
             hour away.",
        ),
        passage(
            CorpusId::AdaGuidelines,
            "ada-hyperglycemia-response",
            "Glucose above 180 mg/dL after meals counts as hyperglycemia. For \
             readings above 250 mg/dL, drink water, avoid additional \
             carbohydrate, and favor light activity such as a 15 minute walk. \
             Contact a care provider about persistent readings above 300 \
             mg/dL or any reading accompanied by nausea or confusion.",
        ),
        passage(
            CorpusId::AdaGuidelines,
            "ada-monitoring-cadence",
            "Structured self-monitoring pairs a fasting reading with \
             post-meal checks one to two hours after eating. Reviewing a 7 \
             day average alongside minimum and maximum readings shows whether \
             management changes are working and where the variability comes \
             from.",
        ),
        passage(
            CorpusId::GlycemicIndex,
            "gi-food-rankings",
            "The glycemic index ranks carbohydrate foods by how quickly they \
             raise blood glucose. Low GI foods (55 or less) include oatmeal, \
             lentils, beans, yogurt, apples, and most non-starchy \
             vegetables. High GI foods (70 or more) include white bread, \
             white rice, pizza, instant cereals, and sugary drinks.",
        ),
        passage(
            CorpusId::GlycemicIndex,
            "gi-lower-swaps",
            "Swapping high glycemic foods for lower glycemic alternatives \
             flattens post-meal glucose spikes: steel-cut oats instead of \
             instant cereal, brown rice or quinoa instead of white rice, \
             whole-grain pasta cooked al dente instead of soft white pasta, \
             and berries instead of dried fruit.",
        ),
        passage(
            CorpusId::GlycemicIndex,
            "gi-meal-pairing",
            "Pairing carbohydrate with protein, fat, or fiber slows digestion \
             and lowers the effective glycemic load of the meal. A salad with \
             chicken produces a flatter glucose curve than the same \
             carbohydrate eaten alone, and adding vegetables to pasta or rice \
             dishes blunts their peak.",
        ),
        passage(
            CorpusId::ExerciseSafety,
            "exercise-pre-check",
            "Check blood glucose before exercise. Below 100 mg/dL, eat a \
             small carbohydrate snack first. Between 100 and 250 mg/dL is \
             generally safe for most activity. Above 250 mg/dL, postpone \
             intense exercise until glucose comes down, since strenuous \
             effort can push it higher.",
        ),
        passage(
            CorpusId::ExerciseSafety,
            "exercise-weekly-dose",
            "Adults with diabetes should aim for at least 150 minutes of \
             moderate-intensity aerobic activity per week, spread over at \
             least three days with no more than two consecutive rest days. \
             Add resistance training such as strength or weights on two or \
             more days per week.",
        ),
        passage(
            CorpusId::ExerciseSafety,
            "exercise-delayed-lows",
            "Moderate and vigorous exercise can keep lowering blood glucose \
             for up to 24 hours. Carry fast-acting carbohydrate during \
             workouts, and watch for delayed hypoglycemia overnight after \
             afternoon or evening sessions, particularly alongside insulin \
             or sulfonylureas.",
        ),
        passage(
            CorpusId::MedicationInteractions,
            "med-metformin-basics",
            "Metformin is the usual first-line medication for type 2 \
             diabetes. Taking it with food reduces stomach upset. Limit \
             alcohol while on metformin: heavy drinking raises the risk of \
             lactic acidosis and can hide the warning signs of low blood \
             sugar.",
        ),
        passage(
            CorpusId::MedicationInteractions,
            "med-insulin-exercise",
            "Insulin and sulfonylureas can cause hypoglycemia during or \
             after exercise. Timing doses away from planned workouts, or \
             adjusting the pre-exercise dose with the prescriber's guidance, \
             lowers that risk. Never change doses without medical advice.",
        ),
        passage(
            CorpusId::MedicationInteractions,
            "med-glucose-raising-drugs",
            "Some common medicines raise blood glucose, including steroids \
             such as prednisone, certain decongestants, and some diuretics. \
             Review new prescriptions and over-the-counter medicines for \
             interactions with diabetes medication before combining them.",
        ),
    ]
}
