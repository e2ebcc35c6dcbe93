//! Sample attribute bags (JSON) for testing and demonstration.
//!
//! Each template exercises a different part of the composer.

/// Arabic invoice with a custom footer, explicit column widths and a total row.
pub fn invoice_template() -> &'static str {
    r##"{
    "company": {
        "name": "شركة المثال",
        "address": "شارع الملك فهد، الرياض",
        "phone": "+966 11 000 0000",
        "email": "billing@example.sa"
    },
    "recipient": ["أحمد علي", "جدة", "ahmed@example.sa"],
    "details": [
        ["رقم الفاتورة", "INV-2024-001"],
        ["تاريخ الإصدار", "2024-01-01"],
        ["طريقة الدفع", "بطاقة ائتمان"]
    ],
    "line_items": [
        ["<b>البند</b>", "<b>الكمية</b>", "<b>السعر</b>"],
        ["استضافة سنوية", "1", "500 ر.س"],
        ["تصميم", "20", "2500 ر.س"],
        ["<b>المجموع</b>", "", "<b>3000 ر.س</b>"]
    ],
    "column_widths": [120, 60, 360],
    "footer": "شكرا لتعاملكم معنا"
}"##
}

/// Receipt that relies on the default contact footer and a custom display list.
pub fn receipt_template() -> &'static str {
    r##"{
    "company": {
        "name": "مقهى النخيل",
        "address": "الدمام",
        "email": "hello@nakheel.example",
        "vat": "الرقم الضريبي 300000000000003",
        "display": ["address", "vat"]
    },
    "recipient": "سارة محمد",
    "details": [
        ["رقم الإيصال", "R-42"],
        ["التاريخ", "2024-03-15"]
    ],
    "line_items": [
        ["الصنف", "الكمية", "المبلغ"],
        ["قهوة عربية", "2", "30 ر.س"],
        ["تمر", "1", "15 ر.س"],
        ["المجموع", "", "45 ر.س"]
    ]
}"##
}

/// Statement on A4 paper with a mixed Arabic/Latin recipient.
pub fn statement_template() -> &'static str {
    r##"{
    "company": {
        "name": "Acme Trading",
        "email": "accounts@acme.example"
    },
    "recipient": ["Jane Doe", "عميل رقم 1024"],
    "details": [["الفترة", "2024-01 / 2024-03"]],
    "line_items": [
        ["التاريخ", "الوصف", "الرصيد"],
        ["2024-01-05", "رصيد افتتاحي", "1000"],
        ["2024-02-10", "دفعة <i>Wire</i>", "1500"],
        ["2024-03-31", "رصيد ختامي", "2500"]
    ],
    "page_size": "A4"
}"##
}

/// Smallest complete bag.
pub fn minimal_template() -> &'static str {
    r##"{
    "company": {"name": "Acme", "email": "a@b.com"},
    "recipient": ["Jane Doe"],
    "details": [["Date", "2024-01-01"]],
    "line_items": [["Item", "Qty", "Price"], ["Widget", "2", "$10"]]
}"##
}

/// A statement with `rows` line items, long enough to span several pages.
pub fn multi_page_template(rows: usize) -> String {
    let mut line_items = vec![serde_json::json!(["البند", "الكمية", "السعر"])];
    for i in 1..=rows {
        line_items.push(serde_json::json!([format!("بند رقم {i}"), "1", format!("{} ر.س", i * 10)]));
    }
    line_items.push(serde_json::json!(["المجموع", "", format!("{} ر.س", rows * (rows + 1) * 5)]));

    serde_json::json!({
        "company": {"name": "Acme", "email": "a@b.com"},
        "recipient": ["Jane Doe"],
        "details": [["Date", "2024-01-01"]],
        "line_items": line_items,
    })
    .to_string()
}
